//! Terminal job status.

use serde::{Deserialize, Serialize};

/// Result of one delegate attempt, and the terminal status a job is reported with.
///
/// The set is closed: a delegate can only produce one of these three values,
/// so every consumer matches it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The delegate completed its work.
    Succeeded,
    /// The delegate failed (returned `Faulted`, an error, or panicked).
    Faulted,
    /// The delegate observed cancellation and stopped early.
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Succeeded => "succeeded",
            JobStatus::Faulted => "faulted",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, JobStatus::Faulted)
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&JobStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");

        let back: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, JobStatus::Cancelled);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(JobStatus::Faulted.to_string(), "faulted");
    }
}
