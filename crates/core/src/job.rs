//! The immutable job value and its lifecycle transitions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delegate::{CancellationToken, JobDelegate, NeverRetry, RetryPredicate};
use crate::error::{JobError, JobResult};
use crate::failure::JobFailure;
use crate::id::JobId;
use crate::status::JobStatus;

/// One unit of work.
///
/// A `Job` is a value: every lifecycle transition returns a new `Job` and leaves
/// the receiver untouched. The identifier, delegate and retry predicate are
/// carried forward unchanged through every derived copy, so a job can be handed
/// across threads without any synchronization of its own.
///
/// ```text
/// create ──enqueue──▶ enqueued_at ──▶ attempted_at ──▶ succeeded_at / faulted_at / cancelled_at
///                                          ▲                          │
///                                          └──── retry (faulted) ─────┘
/// ```
#[derive(Clone)]
pub struct Job {
    id: JobId,
    delegate: Arc<dyn JobDelegate>,
    retry: Arc<dyn RetryPredicate>,
    status: Option<JobStatus>,
    attempts: u32,
    enqueued_at: Option<DateTime<Utc>>,
    first_attempted_at: Option<DateTime<Utc>>,
    last_attempted_at: Option<DateTime<Utc>>,
    succeeded_at: Option<DateTime<Utc>>,
    faulted_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    failure: Option<JobFailure>,
}

impl Job {
    /// Create a job with a fresh identifier.
    pub fn create<F>(delegate: F) -> Self
    where
        F: Fn(&Job, &CancellationToken) -> anyhow::Result<JobStatus> + Send + Sync + 'static,
    {
        Self::create_with_id(JobId::new(), delegate)
    }

    /// Create a job with a caller-supplied identifier.
    pub fn create_with_id<F>(id: JobId, delegate: F) -> Self
    where
        F: Fn(&Job, &CancellationToken) -> anyhow::Result<JobStatus> + Send + Sync + 'static,
    {
        Self::from_parts(id, Arc::new(delegate), Arc::new(NeverRetry))
    }

    /// Create a job around an existing (possibly shared) delegate.
    pub fn from_delegate(id: JobId, delegate: Arc<dyn JobDelegate>) -> Self {
        Self::from_parts(id, delegate, Arc::new(NeverRetry))
    }

    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    fn from_parts(
        id: JobId,
        delegate: Arc<dyn JobDelegate>,
        retry: Arc<dyn RetryPredicate>,
    ) -> Self {
        Self {
            id,
            delegate,
            retry,
            status: None,
            attempts: 0,
            enqueued_at: None,
            first_attempted_at: None,
            last_attempted_at: None,
            succeeded_at: None,
            faulted_at: None,
            cancelled_at: None,
            failure: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// `None` until an attempt resolves; cleared again when a retry starts.
    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    /// Number of delegate invocations stamped so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        self.enqueued_at
    }

    pub fn first_attempted_at(&self) -> Option<DateTime<Utc>> {
        self.first_attempted_at
    }

    pub fn last_attempted_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempted_at
    }

    pub fn succeeded_at(&self) -> Option<DateTime<Utc>> {
        self.succeeded_at
    }

    pub fn faulted_at(&self) -> Option<DateTime<Utc>> {
        self.faulted_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    pub fn delegate(&self) -> &Arc<dyn JobDelegate> {
        &self.delegate
    }

    /// True when both values were derived from the same delegate instance.
    pub fn shares_delegate_with(&self, other: &Job) -> bool {
        Arc::ptr_eq(&self.delegate, &other.delegate)
    }

    /// Ask the job's own retry predicate whether it wants another attempt.
    pub fn is_retry_desired(&self) -> bool {
        self.retry.wants_retry(self)
    }

    /// Run the delegate once against this value.
    pub fn invoke(&self, cancellation: &CancellationToken) -> anyhow::Result<JobStatus> {
        self.delegate.run(self, cancellation)
    }

    /// Time spent waiting in the pool before the first attempt.
    pub fn queue_latency(&self) -> Option<chrono::Duration> {
        Some(self.first_attempted_at? - self.enqueued_at?)
    }

    /// Stamp the instant the job was accepted by a pool.
    ///
    /// First write wins: re-enqueueing a value that already carries a
    /// timestamp keeps the original one.
    #[must_use]
    pub fn with_enqueued_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            enqueued_at: self.enqueued_at.or(Some(at)),
            ..self.clone()
        }
    }

    /// Stamp the start of an attempt.
    ///
    /// Clears any status and failure left by a previous attempt.
    #[must_use]
    pub fn attempted_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            failure: None,
            attempts: self.attempts.saturating_add(1),
            first_attempted_at: self.first_attempted_at.or(Some(at)),
            last_attempted_at: Some(at),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn mark_succeeded(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Succeeded),
            succeeded_at: Some(at),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn mark_faulted(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Faulted),
            faulted_at: Some(at),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn mark_cancelled(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Cancelled),
            cancelled_at: Some(at),
            ..self.clone()
        }
    }

    /// Stamp whichever terminal status an attempt produced.
    #[must_use]
    pub fn resolved_at(&self, status: JobStatus, at: DateTime<Utc>) -> Self {
        match status {
            JobStatus::Succeeded => self.mark_succeeded(at),
            JobStatus::Faulted => self.mark_faulted(at),
            JobStatus::Cancelled => self.mark_cancelled(at),
        }
    }

    #[must_use]
    pub fn with_failure(&self, failure: JobFailure) -> Self {
        Self {
            failure: Some(failure),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_retry<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Job) -> bool + Send + Sync + 'static,
    {
        self.with_retry_predicate(Arc::new(predicate))
    }

    #[must_use]
    pub fn with_retry_predicate(&self, predicate: Arc<dyn RetryPredicate>) -> Self {
        Self {
            retry: predicate,
            ..self.clone()
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            attempts: self.attempts,
            enqueued_at: self.enqueued_at,
            first_attempted_at: self.first_attempted_at,
            last_attempted_at: self.last_attempted_at,
            succeeded_at: self.succeeded_at,
            faulted_at: self.faulted_at,
            cancelled_at: self.cancelled_at,
            failure: self.failure.as_ref().map(JobFailure::message),
        }
    }
}

impl core::fmt::Debug for Job {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("attempts", &self.attempts)
            .field("enqueued_at", &self.enqueued_at)
            .field("last_attempted_at", &self.last_attempted_at)
            .field("failure", &self.failure.as_ref().map(JobFailure::message))
            .finish_non_exhaustive()
    }
}

/// Builder for jobs assembled from optional parts.
#[derive(Default)]
pub struct JobBuilder {
    id: Option<JobId>,
    delegate: Option<Arc<dyn JobDelegate>>,
    retry: Option<Arc<dyn RetryPredicate>>,
}

impl JobBuilder {
    pub fn id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn delegate<F>(self, delegate: F) -> Self
    where
        F: Fn(&Job, &CancellationToken) -> anyhow::Result<JobStatus> + Send + Sync + 'static,
    {
        self.shared_delegate(Arc::new(delegate))
    }

    pub fn shared_delegate(mut self, delegate: Arc<dyn JobDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Job) -> bool + Send + Sync + 'static,
    {
        self.retry = Some(Arc::new(predicate));
        self
    }

    /// Fails with [`JobError::MissingDelegate`] when no delegate was supplied.
    pub fn build(self) -> JobResult<Job> {
        let delegate = self.delegate.ok_or(JobError::MissingDelegate)?;
        Ok(Job::from_parts(
            self.id.unwrap_or_default(),
            delegate,
            self.retry.unwrap_or_else(|| Arc::new(NeverRetry)),
        ))
    }
}

/// Serializable view of a job's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: Option<JobStatus>,
    pub attempts: u32,
    pub enqueued_at: Option<DateTime<Utc>>,
    pub first_attempted_at: Option<DateTime<Utc>>,
    pub last_attempted_at: Option<DateTime<Utc>>,
    pub succeeded_at: Option<DateTime<Utc>>,
    pub faulted_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}
