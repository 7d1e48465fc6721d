// Core data structures for the courier dispatcher

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// A delivery job waiting for exactly one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub coordinates: Coordinate,
}

impl Shipment {
    pub fn new(id: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinates,
        }
    }
}

/// A mobile worker able to accept one shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub coordinates: Coordinate,
}

impl Driver {
    pub fn new(id: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinates,
        }
    }
}

/// A driver considered for a specific shipment, annotated with its distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub driver_id: String,
    pub distance_km: f64,
}

impl RankedCandidate {
    pub fn new(driver_id: impl Into<String>, distance_km: f64) -> Self {
        Self {
            driver_id: driver_id.into(),
            distance_km,
        }
    }
}
