//! Error types for the scheduler module

use std::fmt;

use super::state::SchedulerState;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A round was requested after the run reached a terminal state
    AlreadyTerminated {
        state: SchedulerState,
    },

    /// An offer task died before settling
    OfferTaskFailed {
        round: u64,
        reason: String,
    },

    /// Operator stopped the run between rounds
    Interrupted {
        rounds_completed: u64,
    },

    /// Scheduler configuration or input is unusable
    InvalidConfig {
        field: String,
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyTerminated { state } => {
                write!(f, "Scheduler already terminated in state {}", state)
            }
            Self::OfferTaskFailed { round, reason } => {
                write!(f, "Offer task failed in round {}: {}", round, reason)
            }
            Self::Interrupted { rounds_completed } => {
                write!(f, "Dispatch interrupted after {} round(s)", rounds_completed)
            }
            Self::InvalidConfig { field, reason } => {
                write!(f, "Invalid scheduler config '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}
