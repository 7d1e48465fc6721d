//! Integration tests for the round scheduler

mod common;

use async_trait::async_trait;
use common::{fast_config, la_drivers, la_shipments, ScriptedClient};
use courier::dispatch::{ClientConfig, DispatchClient, DispatchOutcome, HttpDispatchClient};
use courier::models::{Coordinate, Driver, Shipment};
use courier::scheduler::{
    DispatchEvent, RoundScheduler, SchedulerConfig, SchedulerError, SchedulerState,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Convergence Tests
// ============================================================================

#[tokio::test]
async fn test_all_accept_converges_in_first_round() {
    let client = Arc::new(ScriptedClient::new(|_, _| DispatchOutcome::Accepted));
    let mut scheduler =
        RoundScheduler::new(fast_config(3), la_shipments(), &la_drivers(), client.clone())
            .unwrap();

    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.state, SchedulerState::Converged);
    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.assignments.len(), 3);
    assert!(summary.unmatched.is_empty());
    assert_eq!(scheduler.ledger().accepted_count().await, 3);
    // Every shipment was offered to every driver at once
    assert_eq!(client.offers().len(), 9);
}

#[tokio::test]
async fn test_declines_walk_down_the_ranking() {
    // Only the farthest driver accepts s3
    let client = Arc::new(ScriptedClient::new(|shipment, driver| {
        if shipment == "s3" && driver == "d1" {
            DispatchOutcome::Accepted
        } else {
            DispatchOutcome::Declined
        }
    }));
    let shipments = vec![Shipment::new("s3", Coordinate::new(34.052, -118.243))];
    let mut scheduler =
        RoundScheduler::new(fast_config(1), shipments, &la_drivers(), client.clone()).unwrap();

    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.state, SchedulerState::Converged);
    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.assignments.get("s3").map(String::as_str), Some("d1"));

    let drivers: Vec<String> = client.offers().into_iter().map(|(_, d)| d).collect();
    assert_eq!(drivers, vec!["d3", "d2", "d1"]);
}

// ============================================================================
// Exhaustion Tests
// ============================================================================

#[tokio::test]
async fn test_transport_failures_exhaust_single_candidate() {
    let client = Arc::new(ScriptedClient::new(|_, _| {
        DispatchOutcome::TransportFailure("connection refused".to_string())
    }));
    let shipments = vec![Shipment::new("s1", Coordinate::new(34.0375, -118.249))];
    let drivers = vec![Driver::new("d1", Coordinate::new(34.048, -118.302))];
    let mut scheduler =
        RoundScheduler::new(fast_config(3), shipments, &drivers, client.clone()).unwrap();

    let first = scheduler.run_round().await.unwrap();
    assert_eq!(first.dispatched, vec!["s1"]);
    assert_eq!(first.count_outcome("transport_failure"), 1);
    assert_eq!(scheduler.candidates().remaining("s1"), 0);
    // The draining round itself reports exhaustion
    assert_eq!(first.state, SchedulerState::Exhausted);
    assert_eq!(scheduler.state(), SchedulerState::Exhausted);

    // Nothing left to schedule
    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.state, SchedulerState::Exhausted);
    assert_eq!(summary.rounds, 1);
    assert!(summary.assignments.is_empty());
    assert_eq!(summary.unmatched, vec!["s1"]);
    assert_eq!(client.offers().len(), 1);
}

#[tokio::test]
async fn test_all_decline_exhausts_after_queues_drain() {
    let client = Arc::new(ScriptedClient::new(|_, _| DispatchOutcome::Declined));
    let mut scheduler =
        RoundScheduler::new(fast_config(1), la_shipments(), &la_drivers(), client.clone())
            .unwrap();

    let summary = scheduler.run().await.unwrap();

    // The third round drains the queues and ends the run
    assert_eq!(summary.state, SchedulerState::Exhausted);
    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.unmatched, vec!["s1", "s2", "s3"]);
    assert_eq!(client.offers().len(), 9);

    let err = scheduler.run_round().await.unwrap_err();
    assert!(matches!(err, SchedulerError::AlreadyTerminated { .. }));
}

// ============================================================================
// Event Stream Tests
// ============================================================================

#[tokio::test]
async fn test_event_stream_describes_the_run() {
    let client = Arc::new(ScriptedClient::new(|_, driver| {
        if driver == "d2" {
            DispatchOutcome::Accepted
        } else {
            DispatchOutcome::Declined
        }
    }));
    let mut scheduler =
        RoundScheduler::new(fast_config(1), la_shipments(), &la_drivers(), client).unwrap();
    let mut events = scheduler.subscribe();

    let summary = scheduler.run().await.unwrap();
    drop(scheduler);

    let mut collected = Vec::new();
    while let Ok(event) = events.recv().await {
        collected.push(event);
    }

    match collected.first() {
        Some(DispatchEvent::RoundStarted { round, dispatched }) => {
            assert_eq!(*round, 1);
            assert_eq!(dispatched, &vec!["s1", "s2", "s3"]);
        }
        other => panic!("unexpected first event: {other:?}"),
    }

    match collected.last() {
        Some(DispatchEvent::Finished { state, rounds }) => {
            assert_eq!(*state, SchedulerState::Converged);
            assert_eq!(*rounds, summary.rounds);
        }
        other => panic!("unexpected last event: {other:?}"),
    }

    let settled = collected
        .iter()
        .filter(|e| matches!(e, DispatchEvent::OfferSettled { .. }))
        .count();
    let completed = collected
        .iter()
        .filter(|e| matches!(e, DispatchEvent::RoundCompleted { .. }))
        .count();
    // s1 and s2 rank d2 first, s3 reaches d2 in round 2
    assert_eq!(settled, 4);
    assert_eq!(completed as u64, summary.rounds);
}

#[tokio::test]
async fn test_shutdown_stops_between_rounds() {
    let client = Arc::new(ScriptedClient::new(|_, _| DispatchOutcome::Declined));
    let mut scheduler = RoundScheduler::new(
        SchedulerConfig::new(1, Duration::from_secs(60)),
        la_shipments(),
        &la_drivers(),
        client.clone(),
    )
    .unwrap();

    let shutdown = tokio::time::sleep(Duration::from_millis(100));
    let err = scheduler.run_until(shutdown).await.unwrap_err();

    // The first tick fires immediately, the second is a minute away
    assert_eq!(err, SchedulerError::Interrupted { rounds_completed: 1 });
    assert_eq!(client.offers().len(), 3);
    assert_eq!(scheduler.state(), SchedulerState::Running);
}

// ============================================================================
// Pacing Tests
// ============================================================================

/// Declines after a fixed delay and records when each offer ran
struct SlowClient {
    delay: Duration,
    spans: Mutex<Vec<(Instant, Instant)>>,
}

#[async_trait]
impl DispatchClient for SlowClient {
    fn name(&self) -> &str {
        "slow"
    }

    async fn offer(&self, _shipment_id: &str, _driver_id: &str) -> DispatchOutcome {
        let started = Instant::now();
        tokio::time::sleep(self.delay).await;
        self.spans.lock().unwrap().push((started, Instant::now()));
        DispatchOutcome::Declined
    }
}

#[tokio::test]
async fn test_overrunning_rounds_run_back_to_back() {
    let interval = Duration::from_millis(200);
    let client = Arc::new(SlowClient {
        delay: Duration::from_millis(300),
        spans: Mutex::new(Vec::new()),
    });
    let shipments = vec![Shipment::new("s1", Coordinate::new(34.0375, -118.249))];
    let mut scheduler = RoundScheduler::new(
        SchedulerConfig::new(1, interval),
        shipments,
        &la_drivers(),
        client.clone(),
    )
    .unwrap();

    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.state, SchedulerState::Exhausted);

    // One offer per round, so consecutive spans are consecutive rounds
    let spans = client.spans.lock().unwrap().clone();
    assert_eq!(spans.len(), 3);
    for pair in spans.windows(2) {
        let (_, previous_end) = pair[0];
        let (next_start, _) = pair[1];
        assert!(next_start >= previous_end, "rounds overlapped");
        // An overrun is followed at once, not after another interval
        assert!(next_start - previous_end < Duration::from_millis(150));
    }
}

// ============================================================================
// HTTP End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_http_dispatch_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/driver/d2/dispatch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Accepted"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/driver/d[13]/dispatch$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Declined"
        })))
        .mount(&mock_server)
        .await;

    let client = HttpDispatchClient::new(
        ClientConfig::new(mock_server.uri()).with_timeout(Duration::from_secs(5)),
    )
    .unwrap();
    let mut scheduler =
        RoundScheduler::new(fast_config(1), la_shipments(), &la_drivers(), Arc::new(client))
            .unwrap();

    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.state, SchedulerState::Converged);
    assert_eq!(summary.rounds, 2);
    // A driver may hold several shipments
    assert!(summary.assignments.values().all(|d| d == "d2"));
    assert_eq!(summary.assignments.len(), 3);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_unreachable_endpoint_exhausts() {
    // Nothing listens on the discard port
    let client = HttpDispatchClient::new(
        ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let shipments = vec![Shipment::new("s1", Coordinate::new(34.0375, -118.249))];
    let drivers = vec![Driver::new("d1", Coordinate::new(34.048, -118.302))];
    let mut scheduler =
        RoundScheduler::new(fast_config(3), shipments, &drivers, Arc::new(client)).unwrap();

    let report = scheduler.run_round().await.unwrap();
    assert_eq!(report.count_outcome("transport_failure"), 1);
    assert!(!report.offers[0].recorded);
    assert_eq!(report.state, SchedulerState::Exhausted);

    let summary = scheduler.run().await.unwrap();
    assert_eq!(summary.state, SchedulerState::Exhausted);
    assert_eq!(scheduler.ledger().accepted_count().await, 0);
}
