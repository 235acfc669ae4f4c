//! `jobpool-core`: the job value model.
//!
//! This crate contains **pure** primitives (no threads, no IO): the immutable
//! `Job` value, its identifier, terminal status, failure payload and the
//! delegate/retry contracts a pool consumes.

pub mod delegate;
pub mod error;
pub mod failure;
pub mod id;
pub mod job;
pub mod status;

pub use delegate::{CancellationToken, JobDelegate, NeverRetry, RetryPredicate};
pub use error::{JobError, JobResult};
pub use failure::{FailureKind, JobFailure, panic_message};
pub use id::JobId;
pub use job::{Job, JobBuilder, JobSnapshot};
pub use status::JobStatus;
