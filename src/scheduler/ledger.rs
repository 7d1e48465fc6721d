//! Acceptance ledger
//!
//! Records the first driver that accepted each shipment. Entries are never
//! overwritten or removed, so a shipment present here is done.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared first-writer-wins map of shipment id to accepting driver id
///
/// Cloning yields another handle to the same ledger.
#[derive(Debug, Clone, Default)]
pub struct AcceptanceLedger {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl AcceptanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the shipment already has an accepting driver
    pub async fn is_accepted(&self, shipment_id: &str) -> bool {
        self.entries.read().await.contains_key(shipment_id)
    }

    /// Record an acceptance unless one already exists
    ///
    /// Returns `true` if this call created the entry.
    pub async fn record_acceptance(&self, shipment_id: &str, driver_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.entry(shipment_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(driver_id.to_string());
                true
            }
            Entry::Occupied(existing) => {
                tracing::debug!(
                    shipment_id,
                    driver_id,
                    accepted_by = %existing.get(),
                    "Ignoring late acceptance"
                );
                false
            }
        }
    }

    /// Accepting driver for a shipment
    pub async fn driver_for(&self, shipment_id: &str) -> Option<String> {
        self.entries.read().await.get(shipment_id).cloned()
    }

    pub async fn accepted_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Copy of all entries, ordered by shipment id
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
