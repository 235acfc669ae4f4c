//! Failure payload attached to faulted jobs.

use std::any::Any;
use std::sync::Arc;

/// How a delegate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The delegate returned an error.
    Error,
    /// The delegate panicked; the panic was caught at the attempt boundary.
    Panic,
}

/// Cloneable failure payload.
///
/// Jobs are values that get copied on every transition, so the underlying
/// `anyhow::Error` is shared behind an `Arc`. Callers can still downcast it
/// via [`JobFailure::error`].
#[derive(Debug, Clone)]
pub struct JobFailure {
    kind: FailureKind,
    error: Arc<anyhow::Error>,
}

impl JobFailure {
    pub fn from_error(error: anyhow::Error) -> Self {
        Self {
            kind: FailureKind::Error,
            error: Arc::new(error),
        }
    }

    /// Build a failure from a payload captured by `std::panic::catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = panic_message(payload.as_ref());
        Self {
            kind: FailureKind::Panic,
            error: Arc::new(anyhow::anyhow!("delegate panicked: {message}")),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Full error chain, `: `-separated.
    pub fn message(&self) -> String {
        format!("{:#}", self.error)
    }
}

/// Best-effort text of a panic payload (`&str` and `String` payloads).
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl core::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl From<anyhow::Error> for JobFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn message_includes_context_chain() {
        let err = Err::<(), _>(DiskFull).context("writing report").unwrap_err();
        let failure = JobFailure::from_error(err);

        assert_eq!(failure.kind(), FailureKind::Error);
        assert_eq!(failure.message(), "writing report: disk full");
    }

    #[test]
    fn original_error_can_be_downcast() {
        let failure = JobFailure::from(anyhow::Error::new(DiskFull));
        assert!(failure.error().downcast_ref::<DiskFull>().is_some());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let caught = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        let failure = JobFailure::from_panic(caught);

        assert_eq!(failure.kind(), FailureKind::Panic);
        assert_eq!(failure.message(), "delegate panicked: boom 7");

        let caught = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert!(JobFailure::from_panic(caught).message().contains("non-string"));
    }
}
