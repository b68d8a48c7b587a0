use crate::WorkerConfig;
use ventq_core::{ResultSummary, TaskCounters};
use ventq_protocol::{qio, ClaimRequest, Message, MessageCodec, ReportRequest};

use anyhow::Context;
use tokio::net::UnixStream;
use tokio_util::codec::Framed;
use tracing::{error, info};

/// Worker process: pulls tasks from the task queue until the stop sentinel
/// arrives, then reports its summary and exits.
pub struct Worker {
    config: WorkerConfig,
    counters: TaskCounters,
}

impl Worker {
    pub fn new(config: WorkerConfig) -> Self {
        Worker {
            config,
            counters: TaskCounters::default(),
        }
    }

    /// Run the claim/execute loop to completion.
    ///
    /// Failure to open either queue, and any hard failure on the task queue,
    /// abort the worker without a report. A failed report send is logged and
    /// the worker still finishes cleanly.
    pub async fn run(mut self) -> anyhow::Result<ResultSummary> {
        let worker_id = self.config.worker_id;
        let pid = std::process::id();

        // Both handles are opened before the first claim, so a worker that
        // fails startup never consumes or produces a message.
        let task_conn = UnixStream::connect(&self.config.task_queue)
            .await
            .with_context(|| {
                format!(
                    "worker {}: opening task queue {}",
                    worker_id,
                    self.config.task_queue.display()
                )
            })?;
        let result_conn = UnixStream::connect(&self.config.result_queue)
            .await
            .with_context(|| {
                format!(
                    "worker {}: opening result queue {}",
                    worker_id,
                    self.config.result_queue.display()
                )
            })?;

        let mut tasks = Framed::new(task_conn, MessageCodec);
        let mut results = Framed::new(result_conn, MessageCodec);

        info!("Worker #{:02} started (pid {})", worker_id, pid);

        loop {
            qio::send(&mut tasks, Message::Claim(ClaimRequest { worker_id }))
                .await
                .with_context(|| format!("worker {}: claiming a task", worker_id))?;

            let message = qio::receive(&mut tasks)
                .await
                .with_context(|| format!("worker {}: receiving a task", worker_id))?;

            let task = match message {
                Message::Assign(assign) => assign.task,
                other => {
                    anyhow::bail!(
                        "worker {}: unexpected message on task queue: {:?}",
                        worker_id,
                        other.message_type()
                    );
                }
            };

            match task.work() {
                Some(effort) => {
                    info!("Worker #{:02} received task with effort {}", worker_id, effort);
                    tokio::time::sleep(self.config.time_unit * effort).await;
                    self.counters.record(effort);
                }
                None => {
                    info!("Worker #{:02} received termination task", worker_id);

                    let summary = ResultSummary::new(worker_id, pid, self.counters);
                    let report = Message::Report(ReportRequest { summary });
                    if let Err(e) = qio::send(&mut results, report).await {
                        error!("Worker #{:02} failed to send result: {}", worker_id, e);
                    }

                    return Ok(summary);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fatal_when_task_queue_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig {
            worker_id: 1,
            task_queue: dir.path().join("absent-tasks.sock"),
            result_queue: dir.path().join("absent-results.sock"),
            time_unit: Duration::from_millis(1),
        };

        let result = Worker::new(config).run().await;
        assert!(result.is_err());
    }
}
