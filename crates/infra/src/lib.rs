//! Infrastructure layer: the threaded job pool and its configuration.

pub mod jobs;


pub use jobs::{Clock, JobPool, JobPoolConfig, OutcomeListener, PoolError, PoolStats, SystemClock};
