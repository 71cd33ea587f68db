//! Session token and the caller-owned record log

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::lifecycle::{LifecycleRecord, RecordUpdate};

/// Opaque session identifier
///
/// Generated once per session and passed to the orchestrator unchanged.
/// Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What [`SessionLog::apply`] did with an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A pending record was added to the end of the log
    Appended,
    /// A pending record was replaced in place by its settled form
    Settled,
    /// The update was stale or unknown and changed nothing
    Ignored,
}

/// Ordered records of one session
///
/// Records are only ever appended; the one in-place change is a pending
/// record being swapped for its settled form. Settled entries never change.
#[derive(Debug)]
pub struct SessionLog {
    token: SessionToken,
    records: Vec<LifecycleRecord>,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    /// Start a session with a fresh token
    pub fn new() -> Self {
        Self::with_token(SessionToken::generate())
    }

    pub fn with_token(token: SessionToken) -> Self {
        debug!(%token, "SessionLog::with_token: called");
        Self {
            token,
            records: Vec::new(),
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn records(&self) -> &[LifecycleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check whether any record is still waiting on the orchestrator
    pub fn has_pending(&self) -> bool {
        self.records.iter().any(LifecycleRecord::is_pending)
    }

    /// Fold a controller update into the log
    ///
    /// Updates for another session's token, settlements of records that are
    /// not pending, and duplicate pending records are ignored.
    pub fn apply(&mut self, update: RecordUpdate) -> ApplyOutcome {
        let record = update.record();
        if record.request().session_id != self.token.as_str() {
            debug!(id = %record.id(), "apply: update from another session, ignoring");
            return ApplyOutcome::Ignored;
        }

        let existing = self.records.iter().position(|r| r.id() == record.id());
        match (update, existing) {
            (RecordUpdate::Pending(record), None) if record.is_pending() => {
                debug!(id = %record.id(), "apply: appended pending record");
                self.records.push(record);
                ApplyOutcome::Appended
            }
            (RecordUpdate::Settled(record), Some(idx)) if self.records[idx].is_pending() && !record.is_pending() => {
                debug!(id = %record.id(), state = %record.state(), "apply: settled record");
                self.records[idx] = record;
                ApplyOutcome::Settled
            }
            (_, _) => {
                debug!("apply: stale or unknown update, ignoring");
                ApplyOutcome::Ignored
            }
        }
    }

    /// Drop all records and switch to a fresh token
    pub fn new_session(&mut self) -> &SessionToken {
        self.token = SessionToken::generate();
        self.records.clear();
        info!(token = %self.token, "new_session: started");
        &self.token
    }
}
