use jobpool_core::JobStatus;

/// Pool runtime statistics, maintained by the worker thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Non-empty batches drained from the pending buffer
    pub batches: u64,
    /// Delegate invocations, retries included
    pub attempts: u64,
    /// Attempts that were immediately followed by another attempt
    pub retries: u64,
    pub succeeded: u64,
    pub faulted: u64,
    pub cancelled: u64,
    /// Jobs abandoned without an outcome event
    pub unprocessed: u64,
}

impl PoolStats {
    /// Jobs reported through an outcome event.
    pub fn reported(&self) -> u64 {
        self.succeeded + self.faulted + self.cancelled
    }

    pub(crate) fn record_outcome(&mut self, status: JobStatus) {
        match status {
            JobStatus::Succeeded => self.succeeded += 1,
            JobStatus::Faulted => self.faulted += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_sums_terminal_counters() {
        let mut stats = PoolStats::default();
        stats.record_outcome(JobStatus::Succeeded);
        stats.record_outcome(JobStatus::Succeeded);
        stats.record_outcome(JobStatus::Faulted);
        stats.record_outcome(JobStatus::Cancelled);
        stats.unprocessed = 4;

        assert_eq!(stats.reported(), 4);
        assert_eq!(stats.succeeded, 2);
    }

    #[test]
    fn serializes_counters() {
        let json = serde_json::to_value(PoolStats {
            batches: 1,
            attempts: 3,
            retries: 2,
            succeeded: 1,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["retries"], 2);
        assert_eq!(json["unprocessed"], 0);
    }
}
