//! Proximity ranking of drivers for a single shipment

use std::collections::VecDeque;

use crate::geo::distance_km;
use crate::models::{Driver, RankedCandidate, Shipment};

/// Ranked drivers for one shipment, nearest first
///
/// The queue is sorted once at construction and afterwards only loses
/// candidates from the front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQueue {
    candidates: VecDeque<RankedCandidate>,
}

impl CandidateQueue {
    /// Build a queue from candidates, sorting them ascending by distance.
    ///
    /// The sort is stable, so equal distances keep their input order.
    pub fn from_candidates(mut candidates: Vec<RankedCandidate>) -> Self {
        candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Self {
            candidates: candidates.into(),
        }
    }

    /// Remove and return up to `n` candidates from the front
    pub fn pop_batch(&mut self, n: usize) -> Vec<RankedCandidate> {
        let take = n.min(self.candidates.len());
        self.candidates.drain(..take).collect()
    }

    /// Next candidate without consuming it
    pub fn peek(&self) -> Option<&RankedCandidate> {
        self.candidates.front()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedCandidate> {
        self.candidates.iter()
    }
}

/// Rank every driver by distance to the shipment, nearest first
pub fn rank_drivers(shipment: &Shipment, drivers: &[Driver]) -> CandidateQueue {
    let candidates = drivers
        .iter()
        .map(|driver| {
            RankedCandidate::new(
                driver.id.clone(),
                distance_km(driver.coordinates, shipment.coordinates),
            )
        })
        .collect();

    CandidateQueue::from_candidates(candidates)
}
