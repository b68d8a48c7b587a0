use std::process::ExitStatus;

use anyhow::Context;
use tracing::{error, info, warn};

use ventq_core::{ResultSummary, Task};

use crate::config::CoordinatorConfig;
use crate::queue::{QueueIdentity, ResultQueue, TaskQueue};
use crate::registry::WorkerRegistry;

/// Final accounting of a coordinator run.
#[derive(Debug)]
pub struct RunReport {
    /// Summaries received on the result queue, in arrival order.
    pub summaries: Vec<ResultSummary>,

    /// Reaped workers in spawn order; `None` where the wait itself failed.
    pub reaped: Vec<(u32, Option<ExitStatus>)>,
}

impl RunReport {
    /// Total tasks completed across all reporting workers.
    pub fn tasks_done(&self) -> u32 {
        self.summaries.iter().map(|s| s.tasks_done).sum()
    }

    /// Total simulated time across all reporting workers, in effort units.
    pub fn total_time(&self) -> u64 {
        self.summaries.iter().map(|s| s.total_time).sum()
    }
}

/// Coordinator ("ventilator"): owns the task queue write end and the result
/// queue read end, spawns the worker pool, streams tasks and termination
/// sentinels, then collects results and reaps every worker.
pub struct Coordinator {
    config: CoordinatorConfig,
    identity: QueueIdentity,
    registry: WorkerRegistry,
}

impl Coordinator {
    /// Coordinator with the queue identity derived from this process.
    pub fn new(config: CoordinatorConfig) -> Self {
        let identity = QueueIdentity::for_pid(std::process::id());
        Self::with_identity(config, identity)
    }

    pub fn with_identity(config: CoordinatorConfig, identity: QueueIdentity) -> Self {
        Coordinator {
            config,
            identity,
            registry: WorkerRegistry::new(),
        }
    }

    pub fn identity(&self) -> &QueueIdentity {
        &self.identity
    }

    /// Run all phases in order, destroying the queues on every exit path.
    pub async fn run(mut self) -> anyhow::Result<RunReport> {
        let outcome = self.run_phases().await;

        if let Err(e) = self.identity.destroy() {
            error!("Failed to destroy queues: {}", e);
        }

        outcome
    }

    async fn run_phases(&mut self) -> anyhow::Result<RunReport> {
        let (mut task_queue, mut result_queue) = self.setup()?;

        if let Err(e) = self.spawn_workers() {
            // Destroying the queues makes already-spawned workers fail their
            // open or next claim and exit, so the reap below terminates.
            drop(task_queue);
            drop(result_queue);
            self.reap().await;
            return Err(e);
        }

        self.distribute(&task_queue).await;
        self.send_stop_tasks(&task_queue).await;
        // All tasks issued. The endpoint stays up until teardown so workers
        // that have not connected yet still drain their sentinel.
        task_queue.close();

        let summaries = self.collect(&mut result_queue).await;
        let reaped = self.reap().await;

        Ok(RunReport { summaries, reaped })
    }

    /// Create both queues, destroying stale remnants of the same identity
    /// first.
    pub fn setup(&self) -> anyhow::Result<(TaskQueue, ResultQueue)> {
        self.config.validate().context("invalid configuration")?;
        self.identity
            .destroy()
            .context("destroying stale queues")?;

        let task_queue = TaskQueue::create(&self.identity.task_queue, self.config.qsize)?;
        let result_queue =
            match ResultQueue::create(&self.identity.result_queue, self.config.workers as usize) {
                Ok(queue) => queue,
                Err(e) => {
                    drop(task_queue);
                    if let Err(destroy_err) = self.identity.destroy() {
                        error!("Cleanup after failed setup: {}", destroy_err);
                    }
                    return Err(e);
                }
            };

        Ok((task_queue, result_queue))
    }

    /// Spawn exactly `workers` worker processes in id order.
    pub fn spawn_workers(&mut self) -> anyhow::Result<()> {
        for worker_id in 1..=self.config.workers {
            self.registry
                .spawn(&self.config, &self.identity, worker_id)?;
        }
        Ok(())
    }

    /// Stream `tasks` random efforts into the task queue.
    ///
    /// A send blocks while the queue is full; the bounded capacity is the
    /// only flow control. A hard send failure abandons that task.
    pub async fn distribute(&self, task_queue: &TaskQueue) {
        info!("Distributing {} tasks", self.config.tasks);

        for seq in 1..=self.config.tasks {
            let task = Task::random(&mut rand::thread_rng());
            info!("Queuing task #{} with effort {}", seq, task.value());
            if let Err(e) = task_queue.send(task).await {
                error!("Failed to queue task #{}: {}", seq, e);
            }
        }
    }

    /// Enqueue exactly one stop sentinel per worker, after all real tasks.
    ///
    /// FIFO order guarantees every worker receives exactly one sentinel and
    /// none waits forever; which worker ran how many real tasks stays an
    /// uncontrolled race.
    pub async fn send_stop_tasks(&self, task_queue: &TaskQueue) {
        info!("Sending {} termination tasks", self.config.workers);

        for _ in 0..self.config.workers {
            if let Err(e) = task_queue.send(Task::STOP).await {
                error!("Failed to queue termination task: {}", e);
            }
        }
    }

    /// Perform exactly `workers` bounded receives on the result queue.
    ///
    /// A slot that produces nothing within the wait limit is logged as a gap
    /// and skipped, so a worker that died before reporting can never hang
    /// the run.
    pub async fn collect(&self, result_queue: &mut ResultQueue) -> Vec<ResultSummary> {
        info!("Waiting for worker results");

        let limit = self.config.result_wait_limit();
        let mut summaries = Vec::with_capacity(self.config.workers as usize);

        for slot in 1..=self.config.workers {
            match result_queue.receive(limit).await {
                Some(summary) => {
                    info!(
                        "Worker #{:02} (pid {}) processed {} tasks in {} time units",
                        summary.worker_id, summary.pid, summary.tasks_done, summary.total_time
                    );
                    summaries.push(summary);
                }
                None => warn!("No result for slot {} of {}", slot, self.config.workers),
            }
        }

        summaries
    }

    /// Wait for every spawned worker in spawn order.
    pub async fn reap(&mut self) -> Vec<(u32, Option<ExitStatus>)> {
        self.registry.reap_all().await
    }
}
