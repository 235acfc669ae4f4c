//! Single-worker job pool with in-place retry and cooperative shutdown.
//!
//! ## Design
//!
//! - Producers append to a mutex-guarded pending buffer from any thread
//! - One worker thread swaps the buffer out and executes the batch *outside* the lock
//! - A faulted job that wants a retry is re-attempted immediately, in its batch slot
//! - Outcomes are published after the whole batch is resolved, in batch order
//! - Shutdown raises the cancellation token and joins the worker; jobs that never
//!   started end up in the unprocessed set
//!
//! ## Components
//!
//! - `JobPool`: owns the buffer, the worker thread and the shutdown handshake
//! - `JobPoolConfig`: worker name and clock
//! - `PoolStats`: counters maintained by the worker
//! - `PoolError`: caller contract violations and worker defects

pub mod config;
pub mod error;
pub mod pool;
pub mod stats;

pub use config::{Clock, JobPoolConfig, SystemClock};
pub use error::PoolError;
pub use pool::{JobPool, OutcomeListener};
pub use stats::PoolStats;
