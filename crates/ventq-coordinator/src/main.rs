use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use ventq_coordinator::{default_worker_bin, Coordinator, CoordinatorConfig};

#[derive(Parser, Debug)]
#[command(name = "vq-coordinator")]
#[command(about = "Ventilator: distributes effort tasks to a pool of worker processes", long_about = None)]
struct Args {
    /// Number of worker processes to spawn
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    workers: u32,

    /// Number of effort tasks to distribute
    #[arg(short, long)]
    tasks: u32,

    /// Task queue capacity
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    qsize: u32,

    /// Worker binary (defaults to vq-worker beside this executable)
    #[arg(long)]
    worker_bin: Option<PathBuf>,

    /// Length of one simulated effort unit in milliseconds
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,

    /// Upper bound in seconds on waiting for a single result
    #[arg(long)]
    collect_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    ventq_core::logging::init();

    let config = CoordinatorConfig {
        workers: args.workers,
        tasks: args.tasks,
        qsize: args.qsize as usize,
        worker_bin: args.worker_bin.unwrap_or_else(default_worker_bin),
        time_unit: Duration::from_millis(args.time_unit_ms),
        collect_timeout: args.collect_timeout_secs.map(Duration::from_secs),
    };

    info!(
        "Starting {} workers for {} tasks and a queue size of {}",
        config.workers, config.tasks, config.qsize
    );

    let report = Coordinator::new(config).run().await?;

    info!(
        "Run complete: {} results collected, {} tasks done in {} time units, {} workers reaped",
        report.summaries.len(),
        report.tasks_done(),
        report.total_time(),
        report.reaped.len()
    );

    Ok(())
}
