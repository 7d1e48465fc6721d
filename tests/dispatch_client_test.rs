//! HTTP dispatch client tests against a mock driver endpoint

use courier::dispatch::{
    ClientConfig, DispatchClient, DispatchError, DispatchOutcome, HttpDispatchClient,
};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpDispatchClient {
    HttpDispatchClient::new(ClientConfig::new(server.uri()).with_timeout(Duration::from_secs(5)))
        .unwrap()
}

async fn mount_reply(server: &MockServer, driver_id: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/driver/{driver_id}/dispatch")))
        .respond_with(template)
        .mount(server)
        .await;
}

// ============================================================================
// Request Shape
// ============================================================================

#[tokio::test]
async fn test_offer_posts_shipment_id_to_driver_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/driver/d7/dispatch"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({ "shipmentId": "s42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Accepted"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = client_for(&mock_server).offer("s42", "d7").await;
    assert_eq!(outcome, DispatchOutcome::Accepted);
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/driver/d1/dispatch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Declined"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpDispatchClient::new(ClientConfig::new(format!("{}/api/", mock_server.uri())))
        .unwrap();
    assert_eq!(client.offer("s1", "d1").await, DispatchOutcome::Declined);
}

// ============================================================================
// Reply Interpretation
// ============================================================================

#[tokio::test]
async fn test_accepted_in_any_case() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "ACCEPTED" })),
    )
    .await;
    mount_reply(
        &mock_server,
        "d2",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "accepted" })),
    )
    .await;

    let client = client_for(&mock_server);
    assert_eq!(client.offer("s1", "d1").await, DispatchOutcome::Accepted);
    assert_eq!(client.offer("s1", "d2").await, DispatchOutcome::Accepted);
}

#[tokio::test]
async fn test_other_responses_decline() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Declined" })),
    )
    .await;
    mount_reply(
        &mock_server,
        "d2",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": " accepted " })),
    )
    .await;

    let client = client_for(&mock_server);
    assert_eq!(client.offer("s1", "d1").await, DispatchOutcome::Declined);
    // Surrounding whitespace is not an acceptance
    assert_eq!(client.offer("s1", "d2").await, DispatchOutcome::Declined);
}

// ============================================================================
// Transport Failures
// ============================================================================

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(500).set_body_string("boom"),
    )
    .await;

    let client = client_for(&mock_server);
    let err = client.send_offer("s1", "d1").await.unwrap_err();
    assert_eq!(
        err,
        DispatchError::HttpStatus {
            status: 500,
            body: "boom".to_string()
        }
    );

    let outcome = client.offer("s1", "d1").await;
    assert!(matches!(outcome, DispatchOutcome::TransportFailure(ref detail) if detail.contains("500")));
    assert!(!outcome.is_accepted());
}

#[tokio::test]
async fn test_malformed_json_is_transport_failure() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(200).set_body_string("not json"),
    )
    .await;

    let client = client_for(&mock_server);
    let err = client.send_offer("s1", "d1").await.unwrap_err();
    assert!(matches!(err, DispatchError::MalformedReply(_)));
    assert!(matches!(
        client.offer("s1", "d1").await,
        DispatchOutcome::TransportFailure(_)
    ));
}

#[tokio::test]
async fn test_missing_response_field_is_transport_failure() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
    )
    .await;

    let client = client_for(&mock_server);
    let err = client.send_offer("s1", "d1").await.unwrap_err();
    assert!(matches!(err, DispatchError::MalformedReply(_)));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let mock_server = MockServer::start().await;
    mount_reply(
        &mock_server,
        "d1",
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "response": "Accepted" }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let client = HttpDispatchClient::new(
        ClientConfig::new(mock_server.uri()).with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = client.send_offer("s1", "d1").await.unwrap_err();
    assert_eq!(err, DispatchError::Timeout);
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_invalid_endpoint_rejected_at_construction() {
    let result = HttpDispatchClient::new(ClientConfig::new("ftp://example.com"));
    assert!(matches!(result, Err(DispatchError::InvalidUrl(_))));
}
