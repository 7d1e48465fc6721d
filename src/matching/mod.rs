//! Proximity matching between shipments and drivers
//!
//! - [`ranker`] - orders every driver by haversine distance to one shipment
//! - [`candidates`] - ranks drivers for all shipments up front

pub mod candidates;
pub mod ranker;

pub use candidates::CandidateMap;
pub use ranker::{rank_drivers, CandidateQueue};
