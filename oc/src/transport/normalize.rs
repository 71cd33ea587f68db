//! Response normalization
//!
//! The orchestrator has answered with several body shapes over time. Each is
//! decoded into its own private wire type and then folded into one
//! [`ResponseEnvelope`], applying the metadata defaults in a single place.
//!
//! Recognized shapes, checked in this order:
//!
//! - nested: `{request_id, result: {agent_name, output, confidence, metadata: {routing: {...}, ...}}}`
//! - flat: `{execution_id, status, result, metadata: {...}, summary}`
//! - chat: `{session_id, response, metadata: {confidence, sla_tier, latency_ms, request_id, tokens}}`
//!
//! Only the answer text is strict. Metadata fields of an unexpected type are
//! treated as absent, ids of any scalar type are kept as text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::{PolicyStatus, ResponseEnvelope, ResponseMetadata, TransportError};
use super::envelope::{DEFAULT_TIER, NOT_AVAILABLE};

/// Which wire shape a body was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Nested,
    Flat,
    Chat,
}

/// Detect the wire shape of a decoded body without fully decoding it
pub fn detect_shape(body: &Value) -> Option<ResponseShape> {
    let obj = body.as_object()?;
    if obj.contains_key("request_id") && obj.get("result").is_some_and(Value::is_object) {
        Some(ResponseShape::Nested)
    } else if obj.contains_key("execution_id") {
        Some(ResponseShape::Flat)
    } else if obj.contains_key("response") {
        Some(ResponseShape::Chat)
    } else {
        None
    }
}

/// Normalize any recognized response body into a [`ResponseEnvelope`]
///
/// Fails with [`TransportError::MalformedResponse`] when the body matches no
/// known shape, when a known shape has fields of the wrong type, or when no
/// answer text can be found.
pub fn normalize_response(body: &Value) -> Result<ResponseEnvelope, TransportError> {
    let shape = detect_shape(body)
        .ok_or_else(|| TransportError::MalformedResponse("unrecognized response shape".to_string()))?;
    debug!(?shape, "normalize_response: called");

    match shape {
        ResponseShape::Nested => Ok(NestedResponse::deserialize(body)?.into_envelope()),
        ResponseShape::Flat => FlatResponse::deserialize(body)?.into_envelope(),
        ResponseShape::Chat => Ok(ChatResponse::deserialize(body)?.into_envelope()),
    }
}

/// Treat missing and blank strings alike
fn text_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Ids are opaque: strings pass through, other scalars are rendered as JSON
fn opaque_id(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}

/// Decode an optional field, treating a value of the wrong type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Counts may arrive as floats (`88.0`); non-negative finite values are truncated
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.trunc() as u64)),
        _ => None,
    }
}

// Nested shape

#[derive(Debug, Deserialize)]
struct NestedResponse {
    request_id: Option<Value>,
    result: NestedResult,
}

#[derive(Debug, Deserialize)]
struct NestedResult {
    #[serde(default, deserialize_with = "lenient")]
    agent_name: Option<String>,
    output: String,
    #[serde(default, deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    metadata: Option<NestedMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedMetadata {
    #[serde(default, deserialize_with = "lenient")]
    routing: Option<NestedRouting>,
    #[serde(default, deserialize_with = "lenient_count")]
    tokens_used: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    latency_ms: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    sla_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    cost_estimate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedRouting {
    #[serde(default, deserialize_with = "lenient")]
    reason: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    policy_influenced: Option<bool>,
}

impl NestedResponse {
    fn into_envelope(self) -> ResponseEnvelope {
        let meta = self.result.metadata.unwrap_or_default();
        let routing = meta.routing.unwrap_or_default();
        let policy_status = if routing.policy_influenced.unwrap_or(false) {
            PolicyStatus::Warn
        } else {
            PolicyStatus::Pass
        };

        ResponseEnvelope {
            primary_text: self.result.output,
            metadata: ResponseMetadata {
                confidence: self.result.confidence,
                latency_ms: meta.latency_ms,
                tokens_used: meta.tokens_used,
                tier: text_or(meta.sla_tier, DEFAULT_TIER),
                cost_estimate: text_or(meta.cost_estimate, NOT_AVAILABLE),
                routing_reason: text_or(routing.reason, NOT_AVAILABLE),
                policy_status,
                agent: non_blank(self.result.agent_name),
                request_id: opaque_id(self.request_id),
            },
        }
    }
}

// Flat shape

#[derive(Debug, Deserialize)]
struct FlatResponse {
    execution_id: Option<Value>,
    result: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    metadata: Option<FlatMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FlatMetadata {
    #[serde(default, deserialize_with = "lenient")]
    agent: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    routing_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    policy_status: Option<PolicyStatus>,
    #[serde(default, deserialize_with = "lenient_count")]
    latency_ms: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    sla_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    cost_estimate: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    tokens_used: Option<u64>,
}

impl FlatResponse {
    /// Primary text comes from `summary`, then `result.output`, then a bare string `result`
    fn primary_text(&self) -> Option<String> {
        if let Some(summary) = non_blank(self.summary.clone()) {
            return Some(summary);
        }
        match &self.result {
            Some(Value::Object(obj)) => obj.get("output").and_then(Value::as_str).map(str::to_string),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_envelope(self) -> Result<ResponseEnvelope, TransportError> {
        let primary_text = self
            .primary_text()
            .ok_or_else(|| TransportError::MalformedResponse("flat response carries no answer text".to_string()))?;
        let meta = self.metadata.unwrap_or_default();

        Ok(ResponseEnvelope {
            primary_text,
            metadata: ResponseMetadata {
                confidence: meta.confidence,
                latency_ms: meta.latency_ms,
                tokens_used: meta.tokens_used,
                tier: text_or(meta.sla_tier, DEFAULT_TIER),
                cost_estimate: text_or(meta.cost_estimate, NOT_AVAILABLE),
                routing_reason: text_or(meta.routing_reason, NOT_AVAILABLE),
                policy_status: meta.policy_status.unwrap_or_default(),
                agent: non_blank(meta.agent),
                request_id: opaque_id(self.execution_id),
            },
        })
    }
}

// Chat shape

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
    #[serde(default, deserialize_with = "lenient")]
    metadata: Option<ChatMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMetadata {
    #[serde(default, deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    sla_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    latency_ms: Option<u64>,
    request_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    tokens: Option<ChatTokens>,
}

#[derive(Debug, Deserialize)]
struct ChatTokens {
    #[serde(default, deserialize_with = "lenient_count")]
    total: Option<u64>,
}

impl ChatResponse {
    fn into_envelope(self) -> ResponseEnvelope {
        let meta = self.metadata.unwrap_or_default();

        ResponseEnvelope {
            primary_text: self.response,
            metadata: ResponseMetadata {
                confidence: meta.confidence,
                latency_ms: meta.latency_ms,
                tokens_used: meta.tokens.and_then(|t| t.total),
                tier: text_or(meta.sla_tier, DEFAULT_TIER),
                request_id: opaque_id(meta.request_id),
                ..ResponseMetadata::default()
            },
        }
    }
}
