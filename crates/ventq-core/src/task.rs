use crate::{Result, TaskError, MAX_EFFORT};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One unit of simulated work: an effort value in `1..=MAX_EFFORT`, or the
/// reserved stop sentinel telling a worker to report and exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task(u32);

impl Task {
    /// The termination sentinel.
    pub const STOP: Task = Task(0);

    /// Create an effort task, rejecting values outside `1..=MAX_EFFORT`.
    pub fn effort(value: u32) -> Result<Self> {
        if value == 0 || value > MAX_EFFORT {
            return Err(TaskError::EffortOutOfRange(value));
        }
        Ok(Task(value))
    }

    /// Draw an effort task uniformly from `1..=MAX_EFFORT`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Task(rng.gen_range(1..=MAX_EFFORT))
    }

    pub fn is_stop(&self) -> bool {
        self.0 == 0
    }

    /// The effort to execute, or `None` for the stop sentinel.
    pub fn work(&self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0)
        }
    }

    /// Raw task value as carried on the wire.
    pub fn value(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_range() {
        assert!(Task::effort(1).is_ok());
        assert!(Task::effort(MAX_EFFORT).is_ok());
        assert!(matches!(Task::effort(0), Err(TaskError::EffortOutOfRange(0))));
        assert!(Task::effort(MAX_EFFORT + 1).is_err());
    }

    #[test]
    fn test_stop_sentinel() {
        assert!(Task::STOP.is_stop());
        assert_eq!(Task::STOP.work(), None);
        assert_eq!(Task::STOP.value(), 0);

        let task = Task::effort(4).unwrap();
        assert!(!task.is_stop());
        assert_eq!(task.work(), Some(4));
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let task = Task::random(&mut rng);
            let effort = task.work().expect("random task is never the sentinel");
            assert!((1..=MAX_EFFORT).contains(&effort));
        }
    }
}
