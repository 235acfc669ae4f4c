use std::time::Duration;

use anyhow::Context;

use jobpool_core::{CancellationToken, Job, JobStatus};
use jobpool_infra::{JobPool, JobPoolConfig};

const JOBS_ENV: &str = "JOBPOOL_DEMO_JOBS";
const FAULTS_ENV: &str = "JOBPOOL_DEMO_FAULTS";

/// Reads a numeric env var, falling back to `default` when unset or malformed.
fn env_or(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "ignoring malformed value");
            default
        }),
        Err(_) => default,
    }
}

/// Every third job fails its first `faults` attempts and asks to be retried
/// while it has attempts left; the rest succeed immediately.
fn demo_job(index: u32, faults: u32) -> Job {
    if index % 3 != 2 {
        return Job::create(|_job: &Job, _cancel: &CancellationToken| Ok(JobStatus::Succeeded));
    }

    Job::create(move |job: &Job, cancel: &CancellationToken| {
        if cancel.is_cancelled() {
            return Ok(JobStatus::Cancelled);
        }
        if job.attempts() <= faults {
            anyhow::bail!("flaky dependency unavailable (attempt {})", job.attempts());
        }
        Ok(JobStatus::Succeeded)
    })
    .with_retry(move |job: &Job| job.attempts() <= faults)
}

fn main() -> anyhow::Result<()> {
    jobpool_observability::init();

    let jobs = env_or(JOBS_ENV, 10);
    let faults = env_or(FAULTS_ENV, 2);

    let pool = JobPool::start(JobPoolConfig::from_env()).context("failed to start job pool")?;
    let outcomes = pool.subscribe();

    tracing::info!(pool = pool.name(), jobs, faults, "enqueueing demo jobs");
    for index in 0..jobs {
        pool.enqueue(demo_job(index, faults))?;
    }

    for _ in 0..jobs {
        let event = outcomes
            .recv_timeout(Duration::from_secs(30))
            .context("timed out waiting for a job outcome")?;
        println!("{}", serde_json::to_string(&event.job().snapshot())?);
    }

    pool.shutdown()?;

    let stats = pool.stats();
    tracing::info!(
        batches = stats.batches,
        attempts = stats.attempts,
        retries = stats.retries,
        reported = stats.reported(),
        "demo finished"
    );
    println!("{}", serde_json::to_string(&stats)?);

    Ok(())
}
