//! Round results and the event stream published by the scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::state::SchedulerState;
use crate::dispatch::DispatchOutcome;

/// Settled result of one offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub shipment_id: String,
    pub driver_id: String,
    pub distance_km: f64,
    pub outcome: DispatchOutcome,

    /// True when this acceptance was the one written into the ledger
    pub recorded: bool,
}

/// Everything that happened in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u64,

    /// Shipments that received at least one offer, in enumeration order
    pub dispatched: Vec<String>,

    /// Offer results, grouped by shipment in dispatch order
    pub offers: Vec<OfferRecord>,

    /// Shipments accepted so far, across all rounds
    pub accepted: usize,

    pub total: usize,

    /// State after the round's terminal check
    pub state: SchedulerState,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RoundReport {
    /// Offers in this round that ended with the given outcome label
    pub fn count_outcome(&self, label: &str) -> usize {
        self.offers
            .iter()
            .filter(|o| o.outcome.as_str() == label)
            .count()
    }
}

/// Final result of a dispatch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub state: SchedulerState,
    pub rounds: u64,

    /// Shipment id to accepting driver id
    pub assignments: BTreeMap<String, String>,

    /// Shipments without an accepting driver, in enumeration order
    pub unmatched: Vec<String>,

    pub total: usize,
}

impl RunSummary {
    pub fn is_converged(&self) -> bool {
        self.state == SchedulerState::Converged
    }
}

/// Events broadcast while a run progresses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// Candidates were drawn and offers are about to go out
    RoundStarted { round: u64, dispatched: Vec<String> },

    /// One offer settled
    OfferSettled { round: u64, record: OfferRecord },

    /// All offers of a round settled and the terminal check ran
    RoundCompleted {
        round: u64,
        accepted: usize,
        total: usize,
        state: SchedulerState,
    },

    /// No further rounds will run
    Finished { state: SchedulerState, rounds: u64 },
}
