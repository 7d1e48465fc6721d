//! Round scheduler
//!
//! Each round draws the next `batch_size` nearest candidates for every
//! unmatched shipment, offers them all concurrently, waits for every offer to
//! settle and then decides whether to keep going.
//!
//! Candidate queues are popped before any offer task is spawned, so offer
//! tasks only share the [`AcceptanceLedger`].

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::error::{SchedulerError, SchedulerResult};
use super::ledger::AcceptanceLedger;
use super::report::{DispatchEvent, OfferRecord, RoundReport, RunSummary};
use super::state::{SchedulerConfig, SchedulerState};
use crate::dispatch::DispatchClient;
use crate::matching::CandidateMap;
use crate::metrics;
use crate::models::{Driver, RankedCandidate, Shipment};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives dispatch rounds until every shipment is accepted or candidates run out
pub struct RoundScheduler {
    run_id: Uuid,
    config: SchedulerConfig,
    client: Arc<dyn DispatchClient>,
    shipments: Vec<Shipment>,
    candidates: CandidateMap,
    ledger: AcceptanceLedger,

    /// Number the next round will carry
    next_round: u64,
    state: SchedulerState,
    event_tx: broadcast::Sender<DispatchEvent>,
}

impl RoundScheduler {
    /// Rank drivers for every shipment and prepare the first round
    pub fn new(
        config: SchedulerConfig,
        shipments: Vec<Shipment>,
        drivers: &[Driver],
        client: Arc<dyn DispatchClient>,
    ) -> SchedulerResult<Self> {
        let candidates = CandidateMap::build(&shipments, drivers);
        Self::with_candidates(config, shipments, candidates, client)
    }

    /// Use an already built candidate map
    pub fn with_candidates(
        config: SchedulerConfig,
        shipments: Vec<Shipment>,
        candidates: CandidateMap,
        client: Arc<dyn DispatchClient>,
    ) -> SchedulerResult<Self> {
        config.validate()?;

        let mut seen = HashSet::with_capacity(shipments.len());
        for shipment in &shipments {
            if !seen.insert(shipment.id.as_str()) {
                return Err(SchedulerError::invalid_config(
                    "shipments",
                    format!("duplicate shipment id '{}'", shipment.id),
                ));
            }
        }

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            client,
            shipments,
            candidates,
            ledger: AcceptanceLedger::new(),
            next_round: 1,
            state: SchedulerState::Idle,
            event_tx,
        })
    }

    /// Subscribe to round events
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.event_tx.subscribe()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn rounds_completed(&self) -> u64 {
        self.next_round - 1
    }

    pub fn ledger(&self) -> &AcceptanceLedger {
        &self.ledger
    }

    pub fn candidates(&self) -> &CandidateMap {
        &self.candidates
    }

    /// Shipments without an acceptance that still have candidates, in
    /// enumeration order
    pub async fn unmatched_shipments(&self) -> Vec<String> {
        let mut unmatched = Vec::new();
        for shipment in &self.shipments {
            if self.candidates.remaining(&shipment.id) > 0
                && !self.ledger.is_accepted(&shipment.id).await
            {
                unmatched.push(shipment.id.clone());
            }
        }
        unmatched
    }

    async fn all_accepted(&self) -> bool {
        for shipment in &self.shipments {
            if !self.ledger.is_accepted(&shipment.id).await {
                return false;
            }
        }
        true
    }

    /// Run a single round
    pub async fn run_round(&mut self) -> SchedulerResult<RoundReport> {
        if self.state.is_terminal() {
            return Err(SchedulerError::AlreadyTerminated { state: self.state });
        }

        let round = self.next_round;
        self.next_round += 1;
        self.state = SchedulerState::Running;
        let started_at = Utc::now();
        metrics::record_round();

        tracing::info!(run_id = %self.run_id, round, "Round started");

        let unmatched = self.unmatched_shipments().await;

        // Draw every batch before any offer goes out.
        let mut batches: Vec<(String, Vec<RankedCandidate>)> = Vec::with_capacity(unmatched.len());
        for shipment_id in &unmatched {
            let Some(queue) = self.candidates.get_mut(shipment_id) else {
                continue;
            };
            let available = queue.len();
            let batch = queue.pop_batch(self.config.batch_size);
            if batch.is_empty() {
                continue;
            }

            tracing::info!(
                round,
                shipment_id = %shipment_id,
                available,
                offering = batch.len(),
                "Dispatching shipment"
            );
            batches.push((shipment_id.clone(), batch));
        }

        let dispatched: Vec<String> = batches.iter().map(|(id, _)| id.clone()).collect();
        tracing::info!(round, shipments = dispatched.len(), "Offers going out");
        self.emit(DispatchEvent::RoundStarted {
            round,
            dispatched: dispatched.clone(),
        });

        let handles: Vec<_> = batches
            .into_iter()
            .flat_map(|(shipment_id, batch)| {
                batch
                    .into_iter()
                    .map(move |candidate| (shipment_id.clone(), candidate))
            })
            .map(|(shipment_id, candidate)| {
                let client = Arc::clone(&self.client);
                let ledger = self.ledger.clone();
                tokio::spawn(offer_candidate(client, ledger, shipment_id, candidate))
            })
            .collect();

        // Fan-in: every offer settles before the round is judged.
        let results = join_all(handles).await;

        let mut offers = Vec::with_capacity(results.len());
        let mut task_failure = None;
        for result in results {
            match result {
                Ok(record) => offers.push(record),
                Err(e) => {
                    task_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        for record in &offers {
            tracing::info!(
                round,
                shipment_id = %record.shipment_id,
                driver_id = %record.driver_id,
                distance_km = record.distance_km,
                outcome = %record.outcome,
                recorded = record.recorded,
                "Offer settled"
            );
            self.emit(DispatchEvent::OfferSettled {
                round,
                record: record.clone(),
            });
        }

        if let Some(reason) = task_failure {
            self.state = SchedulerState::Failed;
            tracing::error!(round, reason = %reason, "Offer task failed, halting dispatch");
            return Err(SchedulerError::OfferTaskFailed { round, reason });
        }

        let accepted = self.ledger.accepted_count().await;
        let total = self.shipments.len();
        metrics::update_progress(accepted, total);

        // Judged after the barrier: the round that drains the last
        // candidates reports exhaustion itself.
        self.state = if self.all_accepted().await {
            SchedulerState::Converged
        } else if self.unmatched_shipments().await.is_empty() {
            SchedulerState::Exhausted
        } else {
            SchedulerState::Running
        };

        tracing::info!(
            round,
            accepted,
            total,
            state = %self.state,
            "Round completed"
        );
        self.emit(DispatchEvent::RoundCompleted {
            round,
            accepted,
            total,
            state: self.state,
        });

        Ok(RoundReport {
            round,
            dispatched,
            offers,
            accepted,
            total,
            state: self.state,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run rounds until a terminal state
    pub async fn run(&mut self) -> SchedulerResult<RunSummary> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run rounds until a terminal state or until `shutdown` resolves
    ///
    /// Rounds start `interval` apart; a round that overruns the interval is
    /// followed immediately by the next one. `shutdown` is only observed
    /// between rounds, a round in flight always completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> SchedulerResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            run_id = %self.run_id,
            shipments = self.shipments.len(),
            batch_size = self.config.batch_size,
            interval_ms = self.config.interval.as_millis() as u64,
            "Dispatch run starting"
        );

        while !self.state.is_terminal() {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    let rounds_completed = self.rounds_completed();
                    tracing::warn!(rounds_completed, "Shutdown requested, no further rounds");
                    return Err(SchedulerError::Interrupted { rounds_completed });
                }
                _ = ticker.tick() => {}
            }

            self.run_round().await?;
        }

        let summary = self.summary().await;

        match summary.state {
            SchedulerState::Converged => {
                tracing::info!(rounds = summary.rounds, "All shipments accepted");
            }
            SchedulerState::Exhausted => {
                tracing::warn!(
                    rounds = summary.rounds,
                    unmatched = summary.unmatched.len(),
                    "No more available drivers, not all shipments accepted"
                );
            }
            _ => {}
        }

        metrics::record_run_finished(summary.state.as_str());
        self.emit(DispatchEvent::Finished {
            state: summary.state,
            rounds: summary.rounds,
        });

        Ok(summary)
    }

    /// Current assignments and unmatched shipments
    pub async fn summary(&self) -> RunSummary {
        let assignments = self.ledger.snapshot().await;
        let unmatched = self
            .shipments
            .iter()
            .filter(|s| !assignments.contains_key(&s.id))
            .map(|s| s.id.clone())
            .collect();

        RunSummary {
            run_id: self.run_id,
            state: self.state,
            rounds: self.rounds_completed(),
            assignments,
            unmatched,
            total: self.shipments.len(),
        }
    }

    fn emit(&self, event: DispatchEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

async fn offer_candidate(
    client: Arc<dyn DispatchClient>,
    ledger: AcceptanceLedger,
    shipment_id: String,
    candidate: RankedCandidate,
) -> OfferRecord {
    let outcome = {
        let _timer = metrics::start_offer_timer();
        client.offer(&shipment_id, &candidate.driver_id).await
    };
    metrics::record_offer(outcome.as_str());

    let recorded = outcome.is_accepted()
        && ledger
            .record_acceptance(&shipment_id, &candidate.driver_id)
            .await;

    OfferRecord {
        shipment_id,
        driver_id: candidate.driver_id,
        distance_km: candidate.distance_km,
        outcome,
        recorded,
    }
}
