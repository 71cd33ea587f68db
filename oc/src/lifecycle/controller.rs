//! Request lifecycle controller
//!
//! Turns one line of user input into a [`LifecycleRecord`] that is visible as
//! `Pending` before the network call starts and settles exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::LifecycleRecord;
use crate::config::OrchestratorConfig;
use crate::session::SessionToken;
use crate::transport::{OrchestratorClient, RequestEnvelope, Transport, TransportError};

/// Why a submission was refused; no record is produced
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("Input is empty")]
    EmptyInput,

    #[error("A request is already in flight")]
    InFlight,
}

/// Update emitted by [`LifecycleController::submit_streaming`]
#[derive(Debug, Clone)]
pub enum RecordUpdate {
    /// The record was created; the call has not resolved yet
    Pending(LifecycleRecord),
    /// The record reached its terminal state
    Settled(LifecycleRecord),
}

impl RecordUpdate {
    pub fn record(&self) -> &LifecycleRecord {
        match self {
            RecordUpdate::Pending(r) | RecordUpdate::Settled(r) => r,
        }
    }
}

/// Clears the in-flight flag when the submission finishes or is dropped
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Issues orchestrator calls and produces lifecycle records
///
/// Holds no conversation state. The only thing it tracks across calls is
/// whether a submission is still in flight, so overlapping submits are
/// refused even if the caller forgets to gate its input.
pub struct LifecycleController {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

impl LifecycleController {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a controller backed by the HTTP client
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, TransportError> {
        debug!(timeout_ms = config.timeout_ms, "LifecycleController::from_config: called");
        let client = OrchestratorClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.timeout()))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether a submission is still awaiting its outcome
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start a submission
    ///
    /// Returns immediately with the pending record available through
    /// [`Submission::pending`]. Nothing goes over the network until
    /// [`Submission::settle`] is awaited.
    pub fn submit(&self, session: &SessionToken, input: &str) -> Result<Submission, SubmitRejected> {
        debug!(input_len = input.len(), "submit: called");
        if input.trim().is_empty() {
            debug!("submit: empty input, rejected");
            return Err(SubmitRejected::EmptyInput);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("submit: already in flight, rejected");
            return Err(SubmitRejected::InFlight);
        }
        let gate = InFlightGuard(self.in_flight.clone());

        let record = LifecycleRecord::pending(RequestEnvelope::new(session.as_str(), input));
        info!(id = %record.id(), "submit: pending");

        Ok(Submission {
            record,
            started: Instant::now(),
            transport: self.transport.clone(),
            timeout: self.timeout,
            _gate: gate,
        })
    }

    /// Submit and report progress on a channel
    ///
    /// Sends `Pending` before the call and `Settled` after it, then returns
    /// the settled record. A closed channel does not stop the call.
    pub async fn submit_streaming(
        &self,
        session: &SessionToken,
        input: &str,
        updates: mpsc::Sender<RecordUpdate>,
    ) -> Result<LifecycleRecord, SubmitRejected> {
        let submission = self.submit(session, input)?;
        let _ = updates.send(RecordUpdate::Pending(submission.pending().clone())).await;

        let settled = submission.settle().await;
        let _ = updates.send(RecordUpdate::Settled(settled.clone())).await;

        Ok(settled)
    }
}

/// A submission between `pending` and `settled`
pub struct Submission {
    record: LifecycleRecord,
    started: Instant,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    _gate: InFlightGuard,
}

impl Submission {
    /// The pending record, for rendering before the call resolves
    pub fn pending(&self) -> &LifecycleRecord {
        &self.record
    }

    /// Run the call and return the settled record
    ///
    /// Consumes the submission, so the settled record is produced once. The
    /// timeout is enforced here as well as in the transport; when it fires the
    /// transport future is dropped and any late result goes nowhere.
    pub async fn settle(self) -> LifecycleRecord {
        let Submission {
            mut record,
            started,
            transport,
            timeout,
            _gate,
        } = self;

        let outcome = match tokio::time::timeout(timeout, transport.send(record.request(), timeout)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };
        let elapsed = started.elapsed();

        if let Err(e) = record.settle(&outcome, elapsed) {
            warn!(error = %e, "settle: record transition refused");
        }

        match &outcome {
            Ok(_) => info!(id = %record.id(), ?elapsed, "settle: succeeded"),
            Err(e) => info!(id = %record.id(), kind = %e.kind(), ?elapsed, "settle: failed"),
        }

        record
    }
}
