//! Error types for the dispatch client

use thiserror::Error;

/// Result type for dispatch transport operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Transport-level failures while offering a shipment
///
/// These never escape [`super::DispatchClient::offer`]; they are folded into
/// [`super::DispatchOutcome::TransportFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Client could not be constructed
    #[error("Initialization error: {0}")]
    Init(String),

    /// Endpoint URL is unusable
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Connection or protocol error
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Endpoint replied with a non-success status
    #[error("HTTP error ({status}): {body}")]
    HttpStatus { status: u16, body: String },

    /// Reply body could not be interpreted
    #[error("Malformed reply: {0}")]
    MalformedReply(String),
}

impl DispatchError {
    /// Whether a later attempt against the same endpoint could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Init(_) | Self::InvalidUrl(_) | Self::MalformedReply(_) => false,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedReply(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DispatchError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error (503): busy");
        assert_eq!(DispatchError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(DispatchError::Timeout.is_recoverable());
        assert!(DispatchError::HttpStatus {
            status: 502,
            body: String::new()
        }
        .is_recoverable());
        assert!(!DispatchError::HttpStatus {
            status: 404,
            body: String::new()
        }
        .is_recoverable());
        assert!(!DispatchError::MalformedReply("x".into()).is_recoverable());
    }
}
