//! Request lifecycle: records and the controller that produces them

mod controller;
mod record;

pub use controller::{LifecycleController, RecordUpdate, SubmitRejected, Submission};
pub use record::{ErrorDetail, LifecycleError, LifecycleRecord, RecordId, RecordState};
