//! Scheduler state machine and tunables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::{SchedulerError, SchedulerResult};

/// Default number of candidates offered per shipment per round
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Default pause between round starts
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

/// Lifecycle of a dispatch run
///
/// `Idle -> Running -> Converged | Exhausted`. `Failed` is entered when a
/// round cannot complete its bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No round has run yet
    Idle,
    /// Rounds are being scheduled
    Running,
    /// Every shipment has an accepting driver
    Converged,
    /// Some shipment is unmatched and no shipment has candidates left
    Exhausted,
    /// A round failed; no further rounds
    Failed,
}

impl SchedulerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round scheduling tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Candidates offered per shipment per round
    pub batch_size: usize,

    /// Time between the starts of consecutive rounds
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn new(batch_size: usize, interval: Duration) -> Self {
        Self {
            batch_size,
            interval,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.batch_size == 0 {
            return Err(SchedulerError::invalid_config(
                "batch_size",
                "must offer at least 1 candidate per round",
            ));
        }

        if self.interval.is_zero() {
            return Err(SchedulerError::invalid_config(
                "interval",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.interval, Duration::from_millis(2000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_fails() {
        assert!(SchedulerConfig::new(0, Duration::from_millis(10))
            .validate()
            .is_err());
        assert!(SchedulerConfig::new(1, Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SchedulerState::Idle.is_terminal());
        assert!(!SchedulerState::Running.is_terminal());
        assert!(SchedulerState::Converged.is_terminal());
        assert!(SchedulerState::Exhausted.is_terminal());
        assert!(SchedulerState::Failed.is_terminal());
    }
}
