//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use courier::dispatch::{DispatchClient, DispatchOutcome};
use courier::models::{Coordinate, Driver, Shipment};
use courier::scheduler::SchedulerConfig;

/// Three shipments around downtown Los Angeles
pub fn la_shipments() -> Vec<Shipment> {
    vec![
        Shipment::new("s1", Coordinate::new(34.0375, -118.249)),
        Shipment::new("s2", Coordinate::new(34.009, -118.289)),
        Shipment::new("s3", Coordinate::new(34.052, -118.243)),
    ]
}

/// Three drivers around downtown Los Angeles
pub fn la_drivers() -> Vec<Driver> {
    vec![
        Driver::new("d1", Coordinate::new(34.048, -118.302)),
        Driver::new("d2", Coordinate::new(34.027, -118.26)),
        Driver::new("d3", Coordinate::new(34.06, -118.24)),
    ]
}

/// Scheduler config with a short interval so tests finish quickly
pub fn fast_config(batch_size: usize) -> SchedulerConfig {
    SchedulerConfig::new(batch_size, Duration::from_millis(10))
}

/// Keyed JSON layout for the given shipments
pub fn keyed_json(records: &[(&str, f64, f64)]) -> String {
    let body: Vec<String> = records
        .iter()
        .map(|(id, lat, lon)| {
            format!(r#""{id}": {{"coordinates": {{"latitude": {lat}, "longitude": {lon}}}}}"#)
        })
        .collect();
    format!("{{{}}}", body.join(", "))
}

/// Write `content` to `name` inside `dir`
pub fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

/// Dispatch client that answers from a closure and records every offer
pub struct ScriptedClient<F> {
    respond: F,
    offers: Mutex<Vec<(String, String)>>,
}

impl<F> ScriptedClient<F>
where
    F: Fn(&str, &str) -> DispatchOutcome + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            offers: Mutex::new(Vec::new()),
        }
    }

    /// Offers received so far as `(shipment_id, driver_id)`
    pub fn offers(&self) -> Vec<(String, String)> {
        self.offers.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> DispatchClient for ScriptedClient<F>
where
    F: Fn(&str, &str) -> DispatchOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        "scripted"
    }

    async fn offer(&self, shipment_id: &str, driver_id: &str) -> DispatchOutcome {
        self.offers
            .lock()
            .unwrap()
            .push((shipment_id.to_string(), driver_id.to_string()));
        (self.respond)(shipment_id, driver_id)
    }
}
