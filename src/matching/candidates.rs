//! Per-shipment candidate map, built once before dispatch starts

use std::collections::HashMap;

use super::ranker::{rank_drivers, CandidateQueue};
use crate::models::{Driver, Shipment};

/// Ranked candidate queues keyed by shipment id
///
/// Iteration follows the enumeration order of the shipments the map was
/// built from. Every queue is an independent value.
#[derive(Debug, Clone, Default)]
pub struct CandidateMap {
    entries: Vec<(String, CandidateQueue)>,
    index: HashMap<String, usize>,
}

impl CandidateMap {
    /// Rank all drivers for every shipment
    pub fn build(shipments: &[Shipment], drivers: &[Driver]) -> Self {
        let mut map = Self::default();

        for shipment in shipments {
            let queue = rank_drivers(shipment, drivers);
            tracing::debug!(
                shipment_id = %shipment.id,
                candidates = queue.len(),
                nearest_km = ?queue.peek().map(|c| c.distance_km),
                "Ranked candidates"
            );
            map.insert(shipment.id.clone(), queue);
        }

        map
    }

    fn insert(&mut self, shipment_id: String, queue: CandidateQueue) {
        match self.index.get(&shipment_id) {
            Some(&pos) => self.entries[pos].1 = queue,
            None => {
                self.index.insert(shipment_id.clone(), self.entries.len());
                self.entries.push((shipment_id, queue));
            }
        }
    }

    pub fn get(&self, shipment_id: &str) -> Option<&CandidateQueue> {
        self.index.get(shipment_id).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, shipment_id: &str) -> Option<&mut CandidateQueue> {
        match self.index.get(shipment_id) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    /// Remaining candidates for a shipment (0 for unknown ids)
    pub fn remaining(&self, shipment_id: &str) -> usize {
        self.get(shipment_id).map_or(0, CandidateQueue::len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CandidateQueue)> {
        self.entries.iter().map(|(id, queue)| (id.as_str(), queue))
    }
}
