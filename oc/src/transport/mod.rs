//! Transport client for the orchestrator endpoint
//!
//! Owns the single outbound call: request encoding, timeout cancellation,
//! failure classification, and normalization of the response body.

pub mod client;
mod envelope;
mod error;
mod normalize;

pub use client::{OrchestratorClient, Transport, extract_detail};
pub use envelope::{
    DEFAULT_TIER, NOT_AVAILABLE, PolicyStatus, RequestEnvelope, ResponseEnvelope, ResponseMetadata,
};
pub use error::{FailureKind, MALFORMED_MESSAGE, TIMEOUT_MESSAGE, TransportError, UNREACHABLE_MESSAGE};
pub use normalize::{ResponseShape, detect_shape, normalize_response};
