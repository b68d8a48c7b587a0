use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ventq_worker::{Worker, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "vq-worker")]
#[command(about = "Worker process for the vq task ventilator", long_about = None)]
struct Args {
    /// Worker identifier assigned by the coordinator
    #[arg(long)]
    worker_id: u32,

    /// Path of the task queue
    #[arg(long)]
    task_queue: PathBuf,

    /// Path of the result queue
    #[arg(long)]
    result_queue: PathBuf,

    /// Length of one simulated effort unit in milliseconds
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    ventq_core::logging::init();

    let config = WorkerConfig {
        worker_id: args.worker_id,
        task_queue: args.task_queue,
        result_queue: args.result_queue,
        time_unit: Duration::from_millis(args.time_unit_ms),
    };

    Worker::new(config).run().await?;

    Ok(())
}
