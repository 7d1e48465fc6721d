//! Shipment and driver loading
//!
//! Both files use the same JSON layout. Either an object keyed by id:
//!
//! ```json
//! { "65289023243": { "coordinates": { "latitude": 34.009, "longitude": -118.289 } } }
//! ```
//!
//! or an array of records carrying their own id:
//!
//! ```json
//! [ { "id": "1", "coordinates": { "latitude": 34.048, "longitude": -118.302 } } ]
//! ```
//!
//! Enumeration order is the order of the file, which also decides ranking
//! ties between equally distant drivers. Keyed layouts are not re-sorted:
//! ids that look like integers stay where the file put them instead of
//! moving ahead of the others in ascending order, so a driver's tie-break
//! position never depends on the shape of its id.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::models::{Coordinate, Driver, Shipment};

/// Result type for loading operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while reading shipment/driver data
#[derive(Error, Debug)]
pub enum LoadError {
    /// File could not be read
    #[error("Failed to read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// Content is not valid JSON or a record has the wrong shape
    #[error("Invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level value is neither an object nor an array
    #[error("Unsupported layout in {origin}: expected an object keyed by id or an array")]
    UnsupportedLayout { origin: String },

    /// The same id appears twice
    #[error("Duplicate id '{id}' in {origin}")]
    DuplicateId { origin: String, id: String },
}

#[derive(Debug, Deserialize)]
struct KeyedRecord {
    coordinates: Coordinate,
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    id: String,
    coordinates: Coordinate,
}

/// Parse `(id, coordinates)` pairs from either supported layout
fn parse_records(json: &str, origin: &str) -> LoadResult<Vec<(String, Coordinate)>> {
    let json_err = |source| LoadError::Json {
        origin: origin.to_string(),
        source,
    };

    let value: Value = serde_json::from_str(json).map_err(json_err)?;

    let records = match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(id, record)| {
                let record: KeyedRecord = serde_json::from_value(record).map_err(json_err)?;
                Ok((id, record.coordinates))
            })
            .collect::<LoadResult<Vec<_>>>()?,
        Value::Array(items) => {
            let records: Vec<IdRecord> =
                serde_json::from_value(Value::Array(items)).map_err(json_err)?;
            records.into_iter().map(|r| (r.id, r.coordinates)).collect()
        }
        _ => {
            return Err(LoadError::UnsupportedLayout {
                origin: origin.to_string(),
            })
        }
    };

    let mut seen = HashSet::with_capacity(records.len());
    for (id, _) in &records {
        if !seen.insert(id.as_str()) {
            return Err(LoadError::DuplicateId {
                origin: origin.to_string(),
                id: id.clone(),
            });
        }
    }

    Ok(records)
}

/// Parse shipments from a JSON string
pub fn parse_shipments(json: &str, origin: &str) -> LoadResult<Vec<Shipment>> {
    Ok(parse_records(json, origin)?
        .into_iter()
        .map(|(id, coordinates)| Shipment::new(id, coordinates))
        .collect())
}

/// Parse drivers from a JSON string
pub fn parse_drivers(json: &str, origin: &str) -> LoadResult<Vec<Driver>> {
    Ok(parse_records(json, origin)?
        .into_iter()
        .map(|(id, coordinates)| Driver::new(id, coordinates))
        .collect())
}

async fn read_file(path: &Path) -> LoadResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            origin: path.display().to_string(),
            source,
        })
}

/// Load shipments from a JSON file
pub async fn load_shipments(path: &Path) -> LoadResult<Vec<Shipment>> {
    let content = read_file(path).await?;
    let shipments = parse_shipments(&content, &path.display().to_string())?;
    tracing::info!(path = %path.display(), count = shipments.len(), "Loaded shipments");
    Ok(shipments)
}

/// Load drivers from a JSON file
pub async fn load_drivers(path: &Path) -> LoadResult<Vec<Driver>> {
    let content = read_file(path).await?;
    let drivers = parse_drivers(&content, &path.display().to_string())?;
    tracing::info!(path = %path.display(), count = drivers.len(), "Loaded drivers");
    Ok(drivers)
}
