//! Transport error types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the orchestrator did not answer in time
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// Message shown when no connection could be established
pub const UNREACHABLE_MESSAGE: &str = "Unable to connect to server. Please check your connection.";

/// Message shown when a success response could not be decoded
pub const MALFORMED_MESSAGE: &str = "Received an unreadable response from the server.";

/// Errors that can occur on the single orchestrator call
///
/// Every variant is terminal. Nothing in this crate retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Server error {status}: {}", .detail.as_deref().unwrap_or("<no detail>"))]
    ServerError { status: u16, detail: Option<String> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Failure classification carried on settled records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NetworkUnreachable,
    ServerError,
    MalformedResponse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::NetworkUnreachable => "network-unreachable",
            FailureKind::ServerError => "server-error",
            FailureKind::MalformedResponse => "malformed-response",
        };
        write!(f, "{}", s)
    }
}

impl TransportError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Timeout(_) => FailureKind::Timeout,
            TransportError::NetworkUnreachable(_) => FailureKind::NetworkUnreachable,
            TransportError::ServerError { .. } => FailureKind::ServerError,
            TransportError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message for display in the conversation
    ///
    /// Derived only from the error kind and, for server errors, the detail
    /// the server supplied. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
            TransportError::NetworkUnreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            TransportError::ServerError { status, detail } => match detail.as_deref().map(str::trim) {
                Some(d) if !d.is_empty() => d.to_string(),
                _ => format!("Request failed with status {}", status),
            },
            TransportError::MalformedResponse(_) => MALFORMED_MESSAGE.to_string(),
        }
    }
}

/// Classify a reqwest failure
///
/// The client sets no reqwest-level timeout; timeouts come only from
/// [`Transport::send`](super::Transport::send) and carry the real duration.
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_request() {
            TransportError::NetworkUnreachable(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::ServerError {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            TransportError::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::MalformedResponse(err.to_string())
    }
}
