//! Lifecycle records - one per submission

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::transport::{FailureKind, RequestEnvelope, ResponseEnvelope, TransportError};

/// Locally generated record identity, unique within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new time-ordered id
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Short form for display (first 8 chars)
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a record is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    Succeeded,
    Failed,
}

impl RecordState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, RecordState::Pending)
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordState::Pending => "pending",
            RecordState::Succeeded => "succeeded",
            RecordState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Failure attached to a failed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: FailureKind,
    /// Human-readable, never empty
    pub message: String,
    pub status_code: Option<u16>,
}

impl From<&TransportError> for ErrorDetail {
    fn from(err: &TransportError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            status_code: err.status_code(),
        }
    }
}

/// Errors from record transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Record {0} is already settled")]
    AlreadySettled(RecordId),
}

/// One submission and its outcome
///
/// Starts `Pending`; moves once to `Succeeded` or `Failed` and is frozen
/// from then on. Exactly one of `response`/`error` is set once settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    id: RecordId,
    state: RecordState,
    request: RequestEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<ResponseEnvelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settled_at: Option<DateTime<Utc>>,
}

impl LifecycleRecord {
    /// Create a pending record starting now
    pub fn pending(request: RequestEnvelope) -> Self {
        let id = RecordId::generate();
        debug!(%id, "LifecycleRecord::pending: called");
        Self {
            id,
            state: RecordState::Pending,
            request,
            response: None,
            error: None,
            started_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn request(&self) -> &RequestEnvelope {
        &self.request
    }

    pub fn response(&self) -> Option<&ResponseEnvelope> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    pub fn is_pending(&self) -> bool {
        self.state == RecordState::Pending
    }

    /// Time from start to settlement; `None` while pending
    pub fn duration(&self) -> Option<Duration> {
        self.settled_at
            .map(|settled| (settled - self.started_at).to_std().unwrap_or(Duration::ZERO))
    }

    /// Settle with the transport outcome
    ///
    /// `elapsed` is measured on a monotonic clock by the caller, so
    /// `settled_at` never precedes `started_at` even if the wall clock steps.
    /// A record that is already settled is left untouched.
    pub fn settle(
        &mut self,
        outcome: &Result<ResponseEnvelope, TransportError>,
        elapsed: Duration,
    ) -> Result<(), LifecycleError> {
        if self.state.is_settled() {
            debug!(id = %self.id, state = %self.state, "settle: already settled, ignoring");
            return Err(LifecycleError::AlreadySettled(self.id.clone()));
        }

        let delta = TimeDelta::from_std(elapsed).unwrap_or(TimeDelta::zero());
        self.settled_at = Some(self.started_at + delta);

        match outcome {
            Ok(response) => {
                self.state = RecordState::Succeeded;
                self.response = Some(response.clone());
            }
            Err(err) => {
                self.state = RecordState::Failed;
                self.error = Some(ErrorDetail::from(err));
            }
        }

        debug!(id = %self.id, state = %self.state, ?elapsed, "settle: done");
        Ok(())
    }
}
