use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Identifier assigned by the coordinator (1..N).
    pub worker_id: u32,

    /// Path of the task queue to pull from.
    pub task_queue: PathBuf,

    /// Path of the result queue to report on.
    pub result_queue: PathBuf,

    /// Real duration of one simulated effort unit.
    pub time_unit: Duration,
}
