//! HTTP dispatch client
//!
//! Offers a shipment to a driver with
//! `POST {base_url}/driver/{driver_id}/dispatch` and a JSON body
//! `{"shipmentId": "..."}`. The endpoint answers with `{"response": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::error::{DispatchError, DispatchResult};
use super::{DispatchClient, DispatchOutcome};

/// Default worker-facing endpoint
pub const DEFAULT_ENDPOINT: &str = "http://challenge.shipwithbolt.com";

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the HTTP dispatch client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the driver endpoint
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse and check the base URL
    pub fn parsed_base_url(&self) -> DispatchResult<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| DispatchError::InvalidUrl(format!("{}: {e}", self.base_url)))?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(DispatchError::InvalidUrl(format!(
                "{}: must be an http(s) base URL",
                self.base_url
            )));
        }

        Ok(url)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OfferRequest<'a> {
    shipment_id: &'a str,
}

/// Reply from the driver endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OfferReply {
    pub response: String,
}

impl OfferReply {
    /// Interpret the textual response
    pub fn outcome(&self) -> DispatchOutcome {
        if self.response.eq_ignore_ascii_case("accepted") {
            DispatchOutcome::Accepted
        } else {
            DispatchOutcome::Declined
        }
    }
}

// ============================================================================
// HTTP Dispatch Client
// ============================================================================

/// Dispatch client talking to the driver endpoint over HTTP
pub struct HttpDispatchClient {
    base_url: Url,
    http_client: Client,
}

impl HttpDispatchClient {
    /// Create a new dispatch client
    pub fn new(config: ClientConfig) -> DispatchResult<Self> {
        let base_url = config.parsed_base_url()?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("courier/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DispatchError::Init(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// URL for offering a shipment to `driver_id`
    pub fn offer_url(&self, driver_id: &str) -> DispatchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DispatchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["driver", driver_id, "dispatch"]);
        Ok(url)
    }

    /// Send one offer and decode the reply
    pub async fn send_offer(
        &self,
        shipment_id: &str,
        driver_id: &str,
    ) -> DispatchResult<OfferReply> {
        let url = self.offer_url(driver_id)?;

        let response = self
            .http_client
            .post(url)
            .json(&OfferRequest { shipment_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::HttpStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<OfferReply>(&body)
            .map_err(|e| DispatchError::MalformedReply(format!("{e}: {body}")))
    }
}

#[async_trait]
impl DispatchClient for HttpDispatchClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn offer(&self, shipment_id: &str, driver_id: &str) -> DispatchOutcome {
        match self.send_offer(shipment_id, driver_id).await {
            Ok(reply) => {
                tracing::debug!(
                    shipment_id,
                    driver_id,
                    response = %reply.response,
                    "Dispatch reply received"
                );
                reply.outcome()
            }
            Err(e) => {
                tracing::warn!(shipment_id, driver_id, error = %e, "Dispatch transport failure");
                DispatchOutcome::TransportFailure(e.to_string())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
