//! Contracts a job carries for the pool: the work itself and the retry decision.

use crate::job::Job;
use crate::status::JobStatus;

pub use tokio_util::sync::CancellationToken;

/// The unit of work behind a job.
///
/// The pool invokes it with the current job value and the pool's cancellation
/// token. Cancellation is cooperative: a long-running delegate should check
/// `cancellation.is_cancelled()` and return [`JobStatus::Cancelled`].
///
/// Returning `Err` (or panicking) is treated as a [`JobStatus::Faulted`] attempt
/// with the failure attached to the job.
pub trait JobDelegate: Send + Sync {
    fn run(&self, job: &Job, cancellation: &CancellationToken) -> anyhow::Result<JobStatus>;
}

impl<F> JobDelegate for F
where
    F: Fn(&Job, &CancellationToken) -> anyhow::Result<JobStatus> + Send + Sync,
{
    fn run(&self, job: &Job, cancellation: &CancellationToken) -> anyhow::Result<JobStatus> {
        self(job, cancellation)
    }
}

/// Decides whether a faulted job wants another immediate attempt.
///
/// Owned by whoever builds the job, never by the pool. The pool applies no
/// ceiling of its own, so a predicate must eventually return `false` for a job
/// that keeps faulting (e.g. by looking at [`Job::attempts`]).
pub trait RetryPredicate: Send + Sync {
    fn wants_retry(&self, job: &Job) -> bool;
}

impl<F> RetryPredicate for F
where
    F: Fn(&Job) -> bool + Send + Sync,
{
    fn wants_retry(&self, job: &Job) -> bool {
        self(job)
    }
}

/// Default predicate: a faulted job is reported as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn wants_retry(&self, _job: &Job) -> bool {
        false
    }
}
