//! orchconsole - Chat console for a remote orchestration endpoint
//!
//! Forwards user text to the orchestrator and shows the answer as received.
//! There is no business logic here: no retries, no conversation memory, no
//! interpretation of the payload beyond mapping it into display fields.
//!
//! # Modules
//!
//! - [`transport`] - the single outbound call: timeout, failure classification, response normalization
//! - [`lifecycle`] - pending/settled records and the controller that produces them
//! - [`session`] - session token and the caller-owned record log
//! - [`console`] - terminal front end (interactive and one-shot)
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod console;
pub mod lifecycle;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ConsoleConfig, OrchestratorConfig};
pub use lifecycle::{
    ErrorDetail, LifecycleController, LifecycleError, LifecycleRecord, RecordId, RecordState, RecordUpdate,
    SubmitRejected, Submission,
};
pub use session::{ApplyOutcome, SessionLog, SessionToken};
pub use transport::{
    FailureKind, OrchestratorClient, PolicyStatus, RequestEnvelope, ResponseEnvelope, ResponseMetadata, Transport,
    TransportError, normalize_response,
};
