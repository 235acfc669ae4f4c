use chrono::{DateTime, Utc};
use uuid::Uuid;

use jobpool_core::{Job, JobId, JobStatus};

/// Outcome notification for a job that reached a reported, terminal state.
///
/// Notes:
/// - `batch` is the pool-local sequence number of the drain that produced it.
/// - `position` is the job's index among the outcomes of that batch, so events
///   from one batch can be checked for ordering without timestamps.
/// - `job` is the final value; it always carries a status.
#[derive(Debug, Clone)]
pub struct JobEvent {
    event_id: Uuid,
    batch: u64,
    position: usize,
    emitted_at: DateTime<Utc>,
    job: Job,
}

impl JobEvent {
    pub fn new(batch: u64, position: usize, emitted_at: DateTime<Utc>, job: Job) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            batch,
            position,
            emitted_at,
            job,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn batch(&self) -> u64 {
        self.batch
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn emitted_at(&self) -> DateTime<Utc> {
        self.emitted_at
    }

    pub fn job_id(&self) -> JobId {
        self.job.id()
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.job.status()
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn into_job(self) -> Job {
        self.job
    }
}
