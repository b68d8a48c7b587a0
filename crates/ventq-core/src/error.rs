use thiserror::Error;

use crate::MAX_EFFORT;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid effort value: {0} (valid range 1..={MAX_EFFORT})")]
    EffortOutOfRange(u32),
}

pub type Result<T> = std::result::Result<T, TaskError>;
