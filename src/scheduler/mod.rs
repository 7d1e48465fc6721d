//! Round-based dispatch scheduling
//!
//! # Overview
//!
//! Shipments are offered to their nearest drivers in rounds. Every round:
//!
//! 1. picks shipments that are not yet accepted and still have candidates,
//! 2. pops up to `batch_size` candidates off each shipment's ranked queue,
//! 3. sends all offers of the round concurrently,
//! 4. records the first acceptance per shipment in the [`AcceptanceLedger`],
//! 5. waits for every offer to settle and checks for a final state.
//!
//! A popped candidate is never offered the same shipment again, whatever the
//! outcome of its offer. The same driver may be offered different shipments
//! in the same round.
//!
//! ```text
//!            ┌────────┐  first round  ┌─────────┐
//!            │  Idle  │──────────────▶│ Running │◀──┐ unmatched shipments
//!            └────────┘               └────┬────┘───┘ still have candidates
//!                                          │
//!                    ┌─────────────────────┼──────────────────────┐
//!                    ▼                     ▼                      ▼
//!             ┌────────────┐        ┌────────────┐         ┌──────────┐
//!             │ Converged  │        │ Exhausted  │         │  Failed  │
//!             │ all matched│        │ no drivers │         │ task died│
//!             └────────────┘        └────────────┘         └──────────┘
//! ```
//!
//! # Modules
//!
//! - [`round`] - the round loop
//! - [`ledger`] - first-writer-wins acceptance bookkeeping
//! - [`state`] - state machine and tunables
//! - [`report`] - round reports, run summary and broadcast events
//! - [`error`] - scheduler errors
//!
//! # Quick Start
//!
//! ```ignore
//! use courier::dispatch::{ClientConfig, HttpDispatchClient};
//! use courier::scheduler::{RoundScheduler, SchedulerConfig};
//! use std::sync::Arc;
//!
//! let client = Arc::new(HttpDispatchClient::new(ClientConfig::default())?);
//! let mut scheduler =
//!     RoundScheduler::new(SchedulerConfig::default(), shipments, &drivers, client)?;
//!
//! let mut events = scheduler.subscribe();
//! let summary = scheduler.run().await?;
//! println!("{} after {} rounds", summary.state, summary.rounds);
//! ```
//!
//! # Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `batch_size` | 3 | Candidates offered per shipment per round |
//! | `interval` | 2000 ms | Time between round starts |

pub mod error;
pub mod ledger;
pub mod report;
pub mod round;
pub mod state;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use ledger::AcceptanceLedger;
pub use report::{DispatchEvent, OfferRecord, RoundReport, RunSummary};
pub use round::RoundScheduler;
pub use state::{SchedulerConfig, SchedulerState, DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL};
