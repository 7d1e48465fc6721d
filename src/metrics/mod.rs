//! Prometheus metrics for the dispatcher
//!
//! This module provides metrics tracking for:
//! - Rounds: number of rounds run, runs finished by final state
//! - Offers: outcome counts and request latency
//! - Progress: accepted vs. total shipments
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all dispatch metrics
struct DispatchMetrics {
    rounds: Counter,
    offers: CounterVec,
    offer_duration: Histogram,
    shipments_accepted: Gauge,
    shipments_total: Gauge,
    runs_finished: CounterVec,
}

/// Global storage for dispatch metrics
static DISPATCH_METRICS: OnceLock<DispatchMetrics> = OnceLock::new();

/// Set once initialization was attempted; held while registering
static METRICS_INIT_ATTEMPTED: Mutex<bool> = Mutex::new(false);

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = courier::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    let mut attempted = METRICS_INIT_ATTEMPTED
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if *attempted {
        return Ok(());
    }
    *attempted = true;

    let metrics = DispatchMetrics {
        rounds: register_counter!("courier_rounds_total", "Total dispatch rounds run")?,
        offers: register_counter_vec!(
            "courier_offers_total",
            "Total offers sent to drivers by outcome",
            &["outcome"]
        )?,
        offer_duration: register_histogram!(
            "courier_offer_duration_seconds",
            "Time from sending an offer to its settled outcome",
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
        shipments_accepted: register_gauge!(
            "courier_shipments_accepted",
            "Shipments with an accepting driver"
        )?,
        shipments_total: register_gauge!(
            "courier_shipments_total",
            "Shipments loaded for dispatch"
        )?,
        runs_finished: register_counter_vec!(
            "courier_runs_finished_total",
            "Dispatch runs that reached a final state",
            &["state"]
        )?,
    };

    DISPATCH_METRICS
        .set(metrics)
        .map_err(|_| "Dispatch metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    DISPATCH_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the start of a round
pub fn record_round() {
    if let Some(m) = DISPATCH_METRICS.get() {
        m.rounds.inc();
    }
}

/// Record a settled offer
pub fn record_offer(outcome: &str) {
    if let Some(m) = DISPATCH_METRICS.get() {
        m.offers.with_label_values(&[outcome]).inc();
    }
}

/// Update progress gauges
pub fn update_progress(accepted: usize, total: usize) {
    if let Some(m) = DISPATCH_METRICS.get() {
        m.shipments_accepted.set(accepted as f64);
        m.shipments_total.set(total as f64);
    }
}

/// Record the final state of a run
pub fn record_run_finished(state: &str) {
    if let Some(m) = DISPATCH_METRICS.get() {
        m.runs_finished.with_label_values(&[state]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start an offer latency timer
pub fn start_offer_timer() -> MetricsTimer {
    match DISPATCH_METRICS.get() {
        Some(m) => MetricsTimer::new(m.offer_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
