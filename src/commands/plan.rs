use anyhow::{Context, Result};
use serde::Serialize;

use super::classify;
use courier::config::Config;
use courier::loader::{load_drivers, load_shipments};
use courier::matching::CandidateMap;
use courier::models::RankedCandidate;

#[derive(Serialize)]
struct PlanEntry<'a> {
    shipment_id: &'a str,
    candidates: Vec<&'a RankedCandidate>,
}

/// Print each shipment's ranked drivers without contacting anyone
pub async fn plan(config: Config, top: Option<usize>, json: bool) -> Result<()> {
    let shipments = load_shipments(&config.data.shipments_path)
        .await
        .map_err(|e| classify(e, "Failed to load shipments"))?;
    let drivers = load_drivers(&config.data.drivers_path)
        .await
        .map_err(|e| classify(e, "Failed to load drivers"))?;

    let map = CandidateMap::build(&shipments, &drivers);
    let limit = top.unwrap_or(usize::MAX);

    if json {
        let entries: Vec<_> = map
            .iter()
            .map(|(shipment_id, queue)| PlanEntry {
                shipment_id,
                candidates: queue.iter().take(limit).collect(),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to encode plan")?
        );
        return Ok(());
    }

    println!(
        "Candidate plan: {} shipments, {} drivers",
        shipments.len(),
        drivers.len()
    );
    println!("==========================================");

    for (shipment_id, queue) in map.iter() {
        println!("\n{shipment_id}");
        if queue.is_empty() {
            println!("   (no drivers)");
            continue;
        }
        for (rank, candidate) in queue.iter().take(limit).enumerate() {
            println!(
                "   {}. driver {} ({:.3} km)",
                rank + 1,
                candidate.driver_id,
                candidate.distance_km
            );
        }
    }

    Ok(())
}
