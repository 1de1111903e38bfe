//! Error types for the job subsystem.

use admind_commons::JobId;
use admind_store::StorageError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JobError>;

/// Main error type for the job subsystem.
///
/// `NotFound` and `Timeout` are expected, user-facing outcomes (a purged id,
/// a bounded wait that elapsed), not bugs. Command failures do not appear
/// here at the attach/list surface: they are captured into the job record's
/// terminal `FAILED` state and replayed as data.
#[derive(Debug, Error)]
pub enum JobError {
    /// The referenced job never existed or was already purged.
    #[error("Job {0} not found")]
    NotFound(JobId),

    /// No command with this name is registered.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A bounded attach wait elapsed; the job may still be running.
    #[error("Timed out after {elapsed:?} waiting for job {id}; the job may still be running")]
    Timeout { id: JobId, elapsed: Duration },

    /// The store failed to durably record a transition.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// A command reported an execution error.
    #[error("Command execution error: {0}")]
    Execution(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
