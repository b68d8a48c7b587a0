use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use ventq_core::MAX_EFFORT;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Task queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Runtime configuration for one coordinator run, computed once at startup
/// and threaded through queue setup and worker spawns.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Number of worker processes to spawn.
    pub workers: u32,

    /// Number of effort tasks to distribute.
    pub tasks: u32,

    /// Task queue capacity.
    pub qsize: usize,

    /// Worker binary to spawn.
    pub worker_bin: PathBuf,

    /// Real duration of one simulated effort unit.
    pub time_unit: Duration,

    /// Upper bound on waiting for a single result; `None` derives a bound
    /// from the workload.
    pub collect_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.qsize == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Time to wait for one result before logging a gap and moving on.
    ///
    /// The derived default covers the degenerate schedule where a single
    /// worker drains every task at maximum effort, plus slack, so a healthy
    /// run never produces a false gap.
    pub fn result_wait_limit(&self) -> Duration {
        self.collect_timeout.unwrap_or_else(|| {
            let units = u64::from(MAX_EFFORT) * u64::from(self.tasks) + 30;
            self.time_unit
                .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
        })
    }
}

/// Default location of the worker binary: `vq-worker` in the directory of
/// the current executable (cargo places both binaries together).
pub fn default_worker_bin() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("vq-worker")))
        .unwrap_or_else(|| PathBuf::from("vq-worker"))
}
