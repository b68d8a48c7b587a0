use std::process::ExitStatus;

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{error, info};

use crate::config::CoordinatorConfig;
use crate::queue::QueueIdentity;

/// One spawned worker process.
#[derive(Debug)]
pub struct WorkerHandle {
    pub worker_id: u32,
    pub pid: Option<u32>,
    child: Child,
}

/// Ordered record of spawned workers. Reaping follows spawn order and is
/// independent of the order results arrive in.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: Vec<WorkerHandle>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        WorkerRegistry {
            workers: Vec::new(),
        }
    }

    /// Spawn one worker process and record it.
    pub fn spawn(
        &mut self,
        config: &CoordinatorConfig,
        identity: &QueueIdentity,
        worker_id: u32,
    ) -> anyhow::Result<()> {
        let child = Command::new(&config.worker_bin)
            .arg("--worker-id")
            .arg(worker_id.to_string())
            .arg("--task-queue")
            .arg(&identity.task_queue)
            .arg("--result-queue")
            .arg(&identity.result_queue)
            .arg("--time-unit-ms")
            .arg(config.time_unit.as_millis().to_string())
            .spawn()
            .with_context(|| {
                format!(
                    "spawning worker {} from {}",
                    worker_id,
                    config.worker_bin.display()
                )
            })?;

        let pid = child.id();
        match pid {
            Some(pid) => info!("Spawned worker #{:02} (pid {})", worker_id, pid),
            None => info!("Spawned worker #{:02}", worker_id),
        }

        self.workers.push(WorkerHandle {
            worker_id,
            pid,
            child,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every spawned worker in spawn order, logging exit statuses.
    ///
    /// A wait failure is logged and reported as `None`; the loop still
    /// visits every entry.
    pub async fn reap_all(&mut self) -> Vec<(u32, Option<ExitStatus>)> {
        let mut reaped = Vec::with_capacity(self.workers.len());

        for handle in &mut self.workers {
            match handle.child.wait().await {
                Ok(status) => {
                    match handle.pid {
                        Some(pid) => {
                            info!("Worker #{:02} (pid {}) exited with {}", handle.worker_id, pid, status)
                        }
                        None => info!("Worker #{:02} exited with {}", handle.worker_id, status),
                    }
                    reaped.push((handle.worker_id, Some(status)));
                }
                Err(e) => {
                    error!("Failed to reap worker #{:02}: {}", handle.worker_id, e);
                    reaped.push((handle.worker_id, None));
                }
            }
        }

        reaped
    }
}
