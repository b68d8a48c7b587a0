use serde::{Deserialize, Serialize};

/// Counters a worker accumulates while executing effort tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounters {
    /// Number of effort tasks completed.
    pub tasks_done: u32,

    /// Total simulated time spent, in effort units.
    pub total_time: u64,
}

impl TaskCounters {
    /// Account for one completed task of the given effort.
    pub fn record(&mut self, effort: u32) {
        self.tasks_done += 1;
        self.total_time += u64::from(effort);
    }
}

/// Per-worker completion statistics, built exactly once when the worker
/// receives the stop sentinel and consumed exactly once by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Worker identifier assigned at spawn time (1..N).
    pub worker_id: u32,

    /// OS process id of the worker.
    pub pid: u32,

    pub tasks_done: u32,
    pub total_time: u64,
}

impl ResultSummary {
    pub fn new(worker_id: u32, pid: u32, counters: TaskCounters) -> Self {
        ResultSummary {
            worker_id,
            pid,
            tasks_done: counters.tasks_done,
            total_time: counters.total_time,
        }
    }
}
