//! Job model error type.

use thiserror::Error;

/// Result type used across the job model.
pub type JobResult<T> = Result<T, JobError>;

/// Caller contract violations raised while building or parsing job values.
///
/// Failures *inside* a job's delegate are not errors of this kind; they are
/// carried on the job itself as a [`crate::JobFailure`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// A job was built without the delegate that performs its work.
    #[error("job delegate is required")]
    MissingDelegate,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl JobError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
