use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use jobpool_core::{CancellationToken, Job, JobStatus};
use jobpool_infra::{JobPool, JobPoolConfig};

fn noop(_job: &Job, _cancel: &CancellationToken) -> anyhow::Result<JobStatus> {
    Ok(JobStatus::Succeeded)
}

/// Producer-side cost: how long `enqueue` holds the caller.
fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");

    for size in [100_usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = JobPool::start(JobPoolConfig::default().with_name("bench-enqueue"))
                .expect("start pool");
            b.iter(|| {
                for _ in 0..size {
                    black_box(pool.enqueue(Job::create(noop)).expect("enqueue"));
                }
            });
            pool.shutdown().expect("shutdown");
        });
    }

    group.finish();
}

/// End-to-end: enqueue a burst and wait for every outcome event.
fn bench_enqueue_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_and_drain");

    for size in [100_usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = JobPool::start(JobPoolConfig::default().with_name("bench-drain"))
                .expect("start pool");
            let outcomes = pool.subscribe();

            b.iter(|| {
                for _ in 0..size {
                    pool.enqueue(Job::create(noop)).expect("enqueue");
                }
                for _ in 0..size {
                    black_box(outcomes.recv_timeout(Duration::from_secs(10)).expect("outcome"));
                }
            });
            pool.shutdown().expect("shutdown");
        });
    }

    group.finish();
}

/// Cost of the in-place retry loop for a job that faults `retries` times.
fn bench_retry_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("retry_loop");

    for retries in [1_u32, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(retries), &retries, |b, &retries| {
            let pool = JobPool::start(JobPoolConfig::default().with_name("bench-retry"))
                .expect("start pool");
            let outcomes = pool.subscribe();

            b.iter(|| {
                let job = Job::create(move |job, _cancel| {
                    Ok(if job.attempts() <= retries {
                        JobStatus::Faulted
                    } else {
                        JobStatus::Succeeded
                    })
                })
                .with_retry(|_| true);
                pool.enqueue(job).expect("enqueue");
                black_box(outcomes.recv_timeout(Duration::from_secs(10)).expect("outcome"));
            });
            pool.shutdown().expect("shutdown");
        });
    }

    group.finish();
}

criterion_group!(benches, bench_enqueue, bench_enqueue_and_drain, bench_retry_loop);
criterion_main!(benches);
