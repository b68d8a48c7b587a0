mod config;
mod worker;

pub use config::WorkerConfig;
pub use worker::Worker;
