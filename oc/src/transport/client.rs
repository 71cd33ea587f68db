//! Transport trait and the HTTP orchestrator client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{RequestEnvelope, ResponseEnvelope, TransportError, normalize_response};
use crate::config::OrchestratorConfig;

/// A single outbound call to the orchestrator
///
/// Implementations issue exactly one request per call, never retry, and
/// never fall back to another endpoint. When `timeout` elapses the in-flight
/// work must be cancelled, not just ignored.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestEnvelope, timeout: Duration) -> Result<ResponseEnvelope, TransportError>;
}

/// HTTP client for `POST {base_url}{endpoint_path}`
pub struct OrchestratorClient {
    url: String,
    http: Client,
}

impl OrchestratorClient {
    /// Create a client for the given endpoint URL
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let http = Client::builder().build()?;
        Ok(Self { url: url.into(), http })
    }

    /// Create a client from configuration
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, TransportError> {
        debug!(base_url = %config.base_url, "from_config: called");
        Self::new(config.endpoint_url())
    }

    /// Endpoint this client posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue the request and decode the response, without any timeout
    async fn send_inner(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            let detail = extract_detail(&bytes);
            debug!(status = status.as_u16(), has_detail = detail.is_some(), "send_inner: server error");
            return Err(TransportError::ServerError {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await?;
        debug!(body_len = bytes.len(), "send_inner: success status");
        let body: Value = serde_json::from_slice(&bytes)?;
        normalize_response(&body)
    }
}

#[async_trait]
impl Transport for OrchestratorClient {
    async fn send(&self, request: &RequestEnvelope, timeout: Duration) -> Result<ResponseEnvelope, TransportError> {
        debug!(url = %self.url, message_len = request.message.len(), ?timeout, "send: called");

        // Dropping the inner future on timeout aborts the HTTP request
        match tokio::time::timeout(timeout, self.send_inner(request)).await {
            Ok(result) => {
                if let Err(ref e) = result {
                    debug!(kind = %e.kind(), "send: failed");
                }
                result
            }
            Err(_) => {
                warn!(?timeout, "send: timed out, request cancelled");
                Err(TransportError::Timeout(timeout))
            }
        }
    }
}

/// Pull a human-readable detail out of an error body
///
/// Looks at `detail` then `message` in a JSON object. A non-string `detail`
/// (some frameworks send validation error lists) is rendered as compact JSON.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let obj = value.as_object()?;

    ["detail", "message"].iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(Value::String(_)) => None,
        Some(other) => Some(other.to_string()),
    })
}
