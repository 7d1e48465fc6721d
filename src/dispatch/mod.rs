//! Offer delivery to drivers
//!
//! A [`DispatchClient`] sends a single "shipment X is offered to driver Y"
//! request and reports a [`DispatchOutcome`]. Transport problems are values,
//! not errors: the scheduler treats them as a permanent decline for that
//! candidate. Clients never retry.
//!
//! - [`client`] - HTTP implementation against the driver endpoint
//! - [`error`] - transport error classification

pub mod client;
pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::{ClientConfig, HttpDispatchClient, OfferReply, DEFAULT_ENDPOINT};
pub use error::{DispatchError, DispatchResult};

/// Settled result of one offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Driver took the shipment
    Accepted,
    /// Driver answered with anything other than "accepted"
    Declined,
    /// The offer never produced a usable answer
    TransportFailure(String),
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Stable label, used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::TransportFailure(_) => "transport_failure",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Declined => write!(f, "DECLINED"),
            Self::TransportFailure(detail) => write!(f, "TRANSPORT FAILURE: {detail}"),
        }
    }
}

/// Sends offers to drivers
///
/// Implementations must be cheap to share between concurrently running
/// offer tasks.
#[async_trait]
pub trait DispatchClient: Send + Sync {
    /// Client name for logs
    fn name(&self) -> &str;

    /// Offer `shipment_id` to `driver_id` and wait for the answer
    async fn offer(&self, shipment_id: &str, driver_id: &str) -> DispatchOutcome;
}
