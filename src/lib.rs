//! courier - proximity-based shipment dispatcher
//!
//! Matches a fixed set of shipments to a fixed set of drivers by distance and
//! offers every unmatched shipment to its nearest remaining drivers, round
//! after round, until all shipments are accepted or no candidates are left.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`geo`] - Haversine distance
//! - [`matching`] - Per-shipment driver ranking and the candidate map
//! - [`dispatch`] - Offer delivery to the driver endpoint
//! - [`scheduler`] - Round loop, acceptance ledger and run state machine
//! - [`loader`] - Shipment/driver JSON loading
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics
//! - [`models`] - Core data structures and types
//!
//! # Example
//!
//! ```no_run
//! use courier::config::Config;
//! use courier::dispatch::HttpDispatchClient;
//! use courier::scheduler::RoundScheduler;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let shipments = courier::loader::load_shipments(&config.data.shipments_path).await?;
//!     let drivers = courier::loader::load_drivers(&config.data.drivers_path).await?;
//!
//!     let client = Arc::new(HttpDispatchClient::new(config.client_config())?);
//!     let mut scheduler =
//!         RoundScheduler::new(config.scheduler_config(), shipments, &drivers, client)?;
//!     let summary = scheduler.run().await?;
//!     println!("{}: {:?}", summary.state, summary.assignments);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::{DispatchClient, DispatchOutcome, HttpDispatchClient};
    pub use crate::error::{CourierErrorTrait, Error, ErrorCategory, Result};
    pub use crate::matching::{CandidateMap, CandidateQueue};
    pub use crate::models::{Coordinate, Driver, RankedCandidate, Shipment};
    pub use crate::scheduler::{
        AcceptanceLedger, RoundScheduler, RunSummary, SchedulerConfig, SchedulerState,
    };
}

// Direct re-exports for convenience
pub use models::{Coordinate, Driver, RankedCandidate, Shipment};
