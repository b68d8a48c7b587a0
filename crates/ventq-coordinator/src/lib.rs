mod config;
mod coordinator;
mod queue;
mod registry;

pub use config::{default_worker_bin, ConfigError, CoordinatorConfig};
pub use coordinator::{Coordinator, RunReport};
pub use queue::{QueueIdentity, ResultQueue, TaskQueue};
pub use registry::{WorkerHandle, WorkerRegistry};
