use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use super::classify;
use courier::config::Config;
use courier::dispatch::HttpDispatchClient;
use courier::loader::{load_drivers, load_shipments};
use courier::metrics;
use courier::scheduler::{DispatchEvent, RoundScheduler, RunSummary, SchedulerError, SchedulerState};

/// How a dispatch run ended, from the operator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Converged,
    Exhausted,
    Interrupted,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Converged => 0,
            Self::Exhausted => 2,
            Self::Interrupted => 130,
        }
    }
}

/// Parameters for the run command
pub struct RunParams {
    pub config: Config,
    pub print_metrics: bool,
    pub json: bool,
}

pub async fn run(params: RunParams) -> Result<RunOutcome> {
    let RunParams {
        config,
        print_metrics,
        json,
    } = params;

    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let shipments = load_shipments(&config.data.shipments_path)
        .await
        .map_err(|e| classify(e, "Failed to load shipments"))?;
    let drivers = load_drivers(&config.data.drivers_path)
        .await
        .map_err(|e| classify(e, "Failed to load drivers"))?;

    let client = HttpDispatchClient::new(config.client_config())
        .map_err(|e| classify(e, "Failed to create dispatch client"))?;

    let mut scheduler = RoundScheduler::new(
        config.scheduler_config(),
        shipments,
        &drivers,
        Arc::new(client),
    )
    .map_err(|e| classify(e, "Failed to prepare dispatch"))?;

    let reporter = if json {
        None
    } else {
        let mut events = scheduler.subscribe();
        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => print_event(&event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Console reporter fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let result = scheduler.run_until(shutdown).await;
    let summary = scheduler.summary().await;

    // Closing the event channel lets the reporter drain and exit.
    drop(scheduler);
    if let Some(reporter) = reporter {
        reporter.await.context("Console reporter task failed")?;
    }

    let outcome = match result {
        Ok(_) if summary.state == SchedulerState::Converged => RunOutcome::Converged,
        Ok(_) => RunOutcome::Exhausted,
        Err(SchedulerError::Interrupted { .. }) => RunOutcome::Interrupted,
        Err(e) => {
            print_summary(&summary, json)?;
            return Err(classify(e, "Dispatch run failed"));
        }
    };

    print_summary(&summary, json)?;

    if print_metrics {
        match metrics::encode_metrics() {
            Ok(text) => println!("\n{text}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
        }
    }

    Ok(outcome)
}

fn print_event(event: &DispatchEvent) {
    match event {
        DispatchEvent::RoundStarted { round, dispatched } => {
            println!("\nROUND {round}");
            println!("========");
            for shipment_id in dispatched {
                println!("Dispatching shipment: {shipment_id}");
            }
        }
        DispatchEvent::OfferSettled { record, .. } => {
            println!(
                "  {} -> driver {} ({:.3} km): {}",
                record.shipment_id, record.driver_id, record.distance_km, record.outcome
            );
        }
        DispatchEvent::RoundCompleted {
            accepted, total, ..
        } => {
            println!("\n{accepted}/{total} shipments accepted");
        }
        DispatchEvent::Finished { state, .. } => match state {
            SchedulerState::Converged => println!("\nSUCCESS: all shipments accepted"),
            SchedulerState::Exhausted => println!(
                "\nFAILURE: no more available drivers, not all shipments have been accepted"
            ),
            _ => {}
        },
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(summary).context("Failed to encode summary")?;
        println!("{text}");
        return Ok(());
    }

    println!("\nDispatch summary");
    println!("================");
    println!("  Run:      {}", summary.run_id);
    println!("  State:    {}", summary.state);
    println!("  Rounds:   {}", summary.rounds);
    println!(
        "  Accepted: {}/{}",
        summary.assignments.len(),
        summary.total
    );

    for (shipment_id, driver_id) in &summary.assignments {
        println!("    {shipment_id} -> {driver_id}");
    }

    if !summary.unmatched.is_empty() {
        println!("  Unmatched:");
        for shipment_id in &summary.unmatched {
            println!("    {shipment_id}");
        }
    }

    Ok(())
}
