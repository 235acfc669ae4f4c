//! The job pool: pending buffer, worker thread and shutdown handshake.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, error, info, warn};

use jobpool_core::{CancellationToken, Job, JobFailure, JobId, JobStatus, panic_message};
use jobpool_events::{EventBus, InMemoryEventBus, JobEvent, Subscription};

use super::config::{Clock, JobPoolConfig};
use super::error::PoolError;
use super::stats::PoolStats;

/// Synchronous outcome callback, invoked on the worker thread.
pub type OutcomeListener = Arc<dyn Fn(&JobEvent) + Send + Sync>;

/// Pending buffer plus the flag the worker raises if it dies.
#[derive(Default)]
struct Queue {
    jobs: Vec<Job>,
    worker_failed: bool,
}

/// State shared between the pool handle and its worker thread.
struct Shared {
    name: String,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
    queue: Mutex<Queue>,
    wake: Condvar,
    unprocessed: Mutex<Vec<Job>>,
    bus: InMemoryEventBus<JobEvent>,
    listeners: RwLock<Vec<OutcomeListener>>,
    stats: Mutex<PoolStats>,
}

/// How a job left its batch slot.
enum Resolution {
    /// Carries a terminal status; gets an outcome event.
    Reported(Job),
    /// Never attempted before cancellation was observed.
    Abandoned(Job),
}

/// Single-worker job pool.
///
/// `enqueue` may be called from any number of threads; one dedicated worker
/// thread drains and runs the jobs. Share the pool behind an `Arc` when
/// producers live on other threads.
///
/// ```ignore
/// let pool = JobPool::start(JobPoolConfig::default().with_name("mailer"))?;
/// let outcomes = pool.subscribe();
///
/// pool.enqueue(Job::create(|_job, _cancel| Ok(JobStatus::Succeeded)))?;
/// let event = outcomes.recv()?;
///
/// pool.shutdown()?;
/// ```
///
/// Dropping a pool that was never shut down requests shutdown and joins the
/// worker.
pub struct JobPool {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl JobPool {
    /// Spawn the worker thread and return the pool handle.
    pub fn start(config: JobPoolConfig) -> Result<Self, PoolError> {
        let shared = Arc::new(Shared {
            name: config.name.clone(),
            clock: config.clock,
            cancellation: CancellationToken::new(),
            queue: Mutex::new(Queue::default()),
            wake: Condvar::new(),
            unprocessed: Mutex::new(Vec::new()),
            bus: InMemoryEventBus::new(),
            listeners: RwLock::new(Vec::new()),
            stats: Mutex::new(PoolStats::default()),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(config.name)
            .spawn(move || run_worker(&worker_shared))?;
        let worker_id = worker.thread().id();

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
            worker_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Accept a job for execution.
    ///
    /// Stamps `enqueued_at`, appends the job to the pending buffer and wakes the
    /// worker. Never waits on job execution.
    pub fn enqueue(&self, job: Job) -> Result<JobId, PoolError> {
        let mut queue = lock(&self.shared.queue);

        if self.shared.cancellation.is_cancelled() {
            return Err(PoolError::AlreadyShutdown);
        }
        if queue.worker_failed {
            return Err(PoolError::WorkerStopped);
        }

        let job = job.with_enqueued_at(self.shared.clock.now());
        let id = job.id();
        queue.jobs.push(job);
        self.shared.wake.notify_one();

        debug!(pool = %self.shared.name, job_id = %id, pending = queue.jobs.len(), "job enqueued");
        Ok(id)
    }

    /// Request cancellation and block until the worker thread has exited.
    ///
    /// A second call fails with [`PoolError::AlreadyShutdown`], from any thread.
    /// A first call from the worker thread fails with
    /// [`PoolError::CalledFromWorker`] and leaves the pool running. If the
    /// worker died from a panic, that panic is reported as
    /// [`PoolError::WorkerPanicked`].
    pub fn shutdown(&self) -> Result<(), PoolError> {
        {
            let _queue = lock(&self.shared.queue);
            if self.shared.cancellation.is_cancelled() {
                return Err(PoolError::AlreadyShutdown);
            }
            if thread::current().id() == self.worker_id {
                return Err(PoolError::CalledFromWorker);
            }
            self.shared.cancellation.cancel();
            self.shared.wake.notify_all();
        }

        info!(pool = %self.shared.name, "job pool shutdown requested");
        self.join_worker()
    }

    /// Register a callback for every reported outcome.
    ///
    /// Listeners run on the worker thread, after the batch that produced the
    /// outcome is fully resolved and before the next batch starts. A panicking
    /// listener kills the worker (see [`PoolError::WorkerPanicked`]); the jobs
    /// of that batch whose events were not delivered yet land in
    /// [`unprocessed`](Self::unprocessed).
    pub fn on_outcome<F>(&self, listener: F)
    where
        F: Fn(&JobEvent) + Send + Sync + 'static,
    {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Channel-backed subscription to every outcome published from now on.
    pub fn subscribe(&self) -> Subscription<JobEvent> {
        self.shared.bus.subscribe()
    }

    /// Jobs abandoned without an outcome event, in the order they were
    /// abandoned: never attempted before shutdown, or stranded by a worker panic.
    pub fn unprocessed(&self) -> Vec<Job> {
        lock(&self.shared.unprocessed).clone()
    }

    /// Move the abandoned jobs out of the pool.
    pub fn take_unprocessed(&self) -> Vec<Job> {
        mem::take(&mut *lock(&self.shared.unprocessed))
    }

    /// Jobs accepted but not yet drained by the worker.
    pub fn pending_len(&self) -> usize {
        lock(&self.shared.queue).jobs.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.cancellation.is_cancelled()
    }

    /// True while the worker thread exists and has not finished.
    pub fn is_running(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> PoolStats {
        lock(&self.shared.stats).clone()
    }

    fn join_worker(&self) -> Result<(), PoolError> {
        let Some(handle) = lock(&self.worker).take() else {
            return Ok(());
        };

        match handle.join() {
            Ok(()) => {
                info!(pool = %self.shared.name, stats = ?self.stats(), "job pool stopped");
                Ok(())
            }
            Err(payload) => Err(PoolError::WorkerPanicked(panic_message(payload.as_ref()))),
        }
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        if !self.shared.cancellation.is_cancelled() {
            let _queue = lock(&self.shared.queue);
            self.shared.cancellation.cancel();
            self.shared.wake.notify_all();
        }

        // Dropped from inside a delegate or listener: the worker exits on its own.
        if thread::current().id() == self.worker_id {
            return;
        }

        if let Err(err) = self.join_worker() {
            warn!(pool = %self.shared.name, error = %err, "job pool dropped with failed worker");
        }
    }
}

impl core::fmt::Debug for JobPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JobPool")
            .field("name", &self.shared.name)
            .field("shutdown", &self.is_shutdown())
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}

/// Worker thread entry point.
///
/// A panic escaping the loop is a defect: it is logged, the pool stops
/// accepting work, and the panic is re-raised so `shutdown` can report it.
fn run_worker(shared: &Shared) {
    info!(pool = %shared.name, "job pool worker started");

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| shared.work())) {
        error!(
            pool = %shared.name,
            panic = %panic_message(payload.as_ref()),
            "job pool worker panicked"
        );

        let leftover = {
            let mut queue = lock(&shared.queue);
            queue.worker_failed = true;
            mem::take(&mut queue.jobs)
        };
        shared.abandon(leftover);

        panic::resume_unwind(payload);
    }

    info!(pool = %shared.name, "job pool worker stopped");
}

impl Shared {
    fn work(&self) {
        let mut batch_number = 0_u64;

        while !self.cancellation.is_cancelled() {
            let batch = self.next_batch();
            if batch.is_empty() {
                continue;
            }

            batch_number += 1;
            let reported = self.execute_batch(batch_number, batch);
            self.dispatch(batch_number, reported);
        }

        // Jobs enqueued after the last drain but before cancellation.
        let leftover = mem::take(&mut lock(&self.queue).jobs);
        self.abandon(leftover);
    }

    /// Block until there is work (or cancellation), then swap the buffer out.
    fn next_batch(&self) -> Vec<Job> {
        let mut queue = lock(&self.queue);
        while queue.jobs.is_empty() && !self.cancellation.is_cancelled() {
            queue = self.wake.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }
        mem::take(&mut queue.jobs)
    }

    fn execute_batch(&self, batch: u64, jobs: Vec<Job>) -> Vec<Job> {
        debug!(pool = %self.name, batch, size = jobs.len(), "batch drained");
        lock(&self.stats).batches += 1;

        let mut reported = Vec::with_capacity(jobs.len());
        let mut abandoned = Vec::new();

        for job in jobs {
            match self.resolve(job) {
                Resolution::Reported(job) => reported.push(job),
                Resolution::Abandoned(job) => abandoned.push(job),
            }
        }

        self.abandon(abandoned);
        reported
    }

    /// Run one job until it is reported or abandoned.
    fn resolve(&self, mut job: Job) -> Resolution {
        loop {
            if self.cancellation.is_cancelled() {
                // Only a job coming back from a faulted attempt carries a status here.
                return match job.status() {
                    Some(_) => Resolution::Reported(job),
                    None => Resolution::Abandoned(job),
                };
            }

            let (status, attempted) = self.attempt(job.attempted_at(self.clock.now()));
            job = attempted.resolved_at(status, self.clock.now());

            if status.is_faulted() && job.is_retry_desired() {
                lock(&self.stats).retries += 1;
                debug!(
                    pool = %self.name,
                    job_id = %job.id(),
                    attempts = job.attempts(),
                    "job faulted, retrying"
                );
                continue;
            }

            return Resolution::Reported(job);
        }
    }

    /// Invoke the delegate once; errors and panics become `Faulted`.
    ///
    /// The delegate gets a child of the pool token: it observes shutdown, and
    /// cancelling it affects this attempt only.
    fn attempt(&self, job: Job) -> (JobStatus, Job) {
        lock(&self.stats).attempts += 1;
        let cancellation = self.cancellation.child_token();

        match panic::catch_unwind(AssertUnwindSafe(|| job.invoke(&cancellation))) {
            Ok(Ok(status)) => (status, job),
            Ok(Err(err)) => (JobStatus::Faulted, job.with_failure(JobFailure::from_error(err))),
            Err(payload) => (JobStatus::Faulted, job.with_failure(JobFailure::from_panic(payload))),
        }
    }

    /// Publish one event per reported job, in batch order.
    ///
    /// A panicking listener moves the jobs still waiting for their event to the
    /// unprocessed set before the panic continues.
    fn dispatch(&self, batch: u64, reported: Vec<Job>) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut outcomes = reported.into_iter().enumerate();
        while let Some((position, job)) = outcomes.next() {
            if let Some(status) = job.status() {
                lock(&self.stats).record_outcome(status);
            }

            match job.status() {
                Some(JobStatus::Faulted) => {
                    let error = job.failure().map(JobFailure::message).unwrap_or_default();
                    warn!(
                        pool = %self.name,
                        job_id = %job.id(),
                        attempts = job.attempts(),
                        error = %error,
                        "job faulted"
                    )
                }
                status => debug!(
                    pool = %self.name,
                    job_id = %job.id(),
                    status = ?status,
                    attempts = job.attempts(),
                    "job finished"
                ),
            }

            let event = JobEvent::new(batch, position, self.clock.now(), job);
            let notified = panic::catch_unwind(AssertUnwindSafe(|| {
                for listener in &listeners {
                    listener(&event);
                }
            }));
            if let Err(payload) = notified {
                self.abandon(outcomes.by_ref().map(|(_, job)| job).collect());
                panic::resume_unwind(payload);
            }

            if let Err(err) = self.bus.publish(event) {
                warn!(pool = %self.name, error = ?err, "failed to publish job outcome");
            }
        }
    }

    fn abandon(&self, jobs: Vec<Job>) {
        if jobs.is_empty() {
            return;
        }

        warn!(pool = %self.name, count = jobs.len(), "jobs abandoned without an outcome");
        lock(&self.stats).unprocessed += jobs.len() as u64;
        lock(&self.unprocessed).extend(jobs);
    }
}

/// The guarded values are never left half-updated, so a poisoned lock is
/// still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn succeed(_job: &Job, _cancel: &CancellationToken) -> anyhow::Result<JobStatus> {
        Ok(JobStatus::Succeeded)
    }

    #[test]
    fn enqueue_stamps_and_returns_the_job_id() {
        let pool = JobPool::start(JobPoolConfig::default()).unwrap();
        let outcomes = pool.subscribe();

        let job = Job::create(succeed);
        let id = pool.enqueue(job.clone()).unwrap();
        assert_eq!(id, job.id());

        let event = outcomes.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.job_id(), id);
        assert!(event.job().enqueued_at().is_some());
        assert!(job.enqueued_at().is_none());

        pool.shutdown().unwrap();
    }

    #[test]
    fn double_shutdown_is_an_error() {
        let pool = JobPool::start(JobPoolConfig::default()).unwrap();

        pool.shutdown().unwrap();
        assert!(matches!(pool.shutdown(), Err(PoolError::AlreadyShutdown)));
        assert!(pool.is_shutdown());
        assert!(!pool.is_running());
    }

    #[test]
    fn enqueue_after_shutdown_is_rejected() {
        let pool = JobPool::start(JobPoolConfig::default()).unwrap();
        pool.shutdown().unwrap();

        let err = pool.enqueue(Job::create(succeed)).unwrap_err();
        assert!(matches!(err, PoolError::AlreadyShutdown));
        assert_eq!(pool.pending_len(), 0);
        assert!(pool.unprocessed().is_empty());
    }

    #[test]
    fn idle_shutdown_returns_promptly() {
        let pool = JobPool::start(JobPoolConfig::default().with_name("idle")).unwrap();
        assert_eq!(pool.name(), "idle");

        pool.shutdown().unwrap();
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    fn worker_thread_carries_the_configured_name() {
        let pool = JobPool::start(JobPoolConfig::default().with_name("named-worker")).unwrap();
        let (tx, rx) = mpsc::channel();

        let job = Job::create(move |_job, _cancel| {
            let _ = tx.send(thread::current().name().map(str::to_string));
            Ok(JobStatus::Succeeded)
        });
        pool.enqueue(job).unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("named-worker"));
        pool.shutdown().unwrap();
    }

    #[test]
    fn dropping_the_pool_stops_the_worker() {
        let pool = JobPool::start(JobPoolConfig::default()).unwrap();
        let outcomes = pool.subscribe();

        drop(pool);

        assert!(matches!(
            outcomes.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn take_unprocessed_empties_the_set() {
        let pool = JobPool::start(JobPoolConfig::default()).unwrap();
        lock(&pool.shared.unprocessed).push(Job::create(succeed));

        assert_eq!(pool.take_unprocessed().len(), 1);
        assert!(pool.unprocessed().is_empty());
        pool.shutdown().unwrap();
    }
}
