//! Job pool configuration.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of the timestamps stamped on jobs and events.
pub trait Clock: core::fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Environment variable read by [`JobPoolConfig::from_env`].
pub const NAME_ENV: &str = "JOBPOOL_NAME";

/// Job pool configuration.
#[derive(Debug, Clone)]
pub struct JobPoolConfig {
    /// Worker thread name, also used as the `pool` field in logs
    pub name: String,
    /// Timestamp source
    pub clock: Arc<dyn Clock>,
}

impl Default for JobPoolConfig {
    fn default() -> Self {
        Self {
            name: "job-pool".to_string(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl JobPoolConfig {
    /// Defaults, overridden by `JOBPOOL_NAME` when set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self::default();
        match lookup(NAME_ENV).map(|v| v.trim().to_string()) {
            Some(name) if !name.is_empty() => config.with_name(name),
            _ => config,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = JobPoolConfig::default();
        assert_eq!(cfg.name, "job-pool");
    }

    #[test]
    fn lookup_overrides_name() {
        let cfg = JobPoolConfig::from_lookup(|key| {
            assert_eq!(key, NAME_ENV);
            Some(" ingest ".to_string())
        });
        assert_eq!(cfg.name, "ingest");
    }

    #[test]
    fn blank_or_missing_name_keeps_default() {
        assert_eq!(JobPoolConfig::from_lookup(|_| None).name, "job-pool");
        assert_eq!(JobPoolConfig::from_lookup(|_| Some("  ".into())).name, "job-pool");
    }

    #[test]
    fn builder_methods() {
        #[derive(Debug)]
        struct Epoch;
        impl Clock for Epoch {
            fn now(&self) -> DateTime<Utc> {
                DateTime::<Utc>::UNIX_EPOCH
            }
        }

        let cfg = JobPoolConfig::default()
            .with_name("mailer")
            .with_clock(Arc::new(Epoch));
        assert_eq!(cfg.name, "mailer");
        assert_eq!(cfg.clock.now(), DateTime::<Utc>::UNIX_EPOCH);
    }
}
