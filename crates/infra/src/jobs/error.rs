use thiserror::Error;

/// Job pool error.
///
/// Every variant is reported synchronously to the caller that triggered it.
/// Failures inside job delegates never show up here; they are carried on the
/// reported job instead.
#[derive(Debug, Error)]
pub enum PoolError {
    /// `enqueue` or `shutdown` after shutdown was already requested.
    #[error("job pool has already been shut down")]
    AlreadyShutdown,

    /// `enqueue` after the worker thread died; nothing would ever run the job.
    #[error("job pool worker has stopped")]
    WorkerStopped,

    /// The worker thread panicked outside of a job delegate (e.g. in an
    /// outcome listener). Surfaced by `shutdown`.
    #[error("job pool worker panicked: {0}")]
    WorkerPanicked(String),

    /// `shutdown` was called from the worker thread, which cannot join itself.
    #[error("shutdown cannot be called from the job pool worker thread")]
    CalledFromWorker,

    /// The worker thread could not be spawned.
    #[error("failed to spawn job pool worker: {0}")]
    Spawn(#[from] std::io::Error),
}
