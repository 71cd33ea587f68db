//! Request/response envelopes exchanged with the orchestrator
//!
//! The request side mirrors the wire body exactly. The response side is the
//! internal, fully populated shape produced by [`super::normalize_response`];
//! it never mirrors any one wire shape.

use serde::{Deserialize, Serialize};

/// Tier label used when the orchestrator does not report one
pub const DEFAULT_TIER: &str = "default";

/// Placeholder for unreported free-text metadata
pub const NOT_AVAILABLE: &str = "N/A";

/// Outbound request body - exactly two fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Opaque session token, passed through unchanged
    pub session_id: String,

    /// Raw user text
    pub message: String,
}

impl RequestEnvelope {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// Policy verdict attached by the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyStatus {
    #[default]
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PolicyStatus::Pass => "PASS",
            PolicyStatus::Warn => "WARN",
            PolicyStatus::Fail => "FAIL",
        };
        write!(f, "{}", s)
    }
}

/// Normalized response metadata
///
/// Numeric fields stay optional: `None` means "not reported", which display
/// code renders as `unknown` instead of a made-up zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub confidence: Option<f64>,
    pub latency_ms: Option<u64>,
    pub tokens_used: Option<u64>,
    pub tier: String,
    pub cost_estimate: String,
    pub routing_reason: String,
    pub policy_status: PolicyStatus,
    pub agent: Option<String>,
    pub request_id: Option<String>,
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self {
            confidence: None,
            latency_ms: None,
            tokens_used: None,
            tier: DEFAULT_TIER.to_string(),
            cost_estimate: NOT_AVAILABLE.to_string(),
            routing_reason: NOT_AVAILABLE.to_string(),
            policy_status: PolicyStatus::Pass,
            agent: None,
            request_id: None,
        }
    }
}

impl ResponseMetadata {
    /// Confidence formatted for display
    pub fn confidence_label(&self) -> String {
        match self.confidence {
            Some(c) => format!("{:.0}%", c * 100.0),
            None => "unknown".to_string(),
        }
    }

    /// Latency formatted for display
    pub fn latency_label(&self) -> String {
        match self.latency_ms {
            Some(ms) => format!("{}ms", ms),
            None => "unknown".to_string(),
        }
    }

    /// Token usage formatted for display
    pub fn tokens_label(&self) -> String {
        match self.tokens_used {
            Some(t) => t.to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// Result of a successful orchestrator call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Text to display as the answer
    pub primary_text: String,

    /// Always populated; defaults fill unreported fields
    pub metadata: ResponseMetadata,
}
