//! Job status derivation.
//!
//! Upstream polls return a bag of flags and counters rather than one status
//! field; collapsing them to a single state follows a strict precedence so
//! a job is never reported in two states at once.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Faulted,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Faulted => "faulted",
        }
    }

    /// Terminal states never change on later polls.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Faulted)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse upstream poll flags to one status.
///
/// Precedence: faulted beats everything (even when `done` is also set),
/// then done, then a non-zero processing count; the default is queued.
pub fn derive_status(faulted: bool, done: bool, processing: i64) -> JobStatus {
    if faulted {
        JobStatus::Faulted
    } else if done {
        JobStatus::Completed
    } else if processing > 0 {
        JobStatus::Processing
    } else {
        JobStatus::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faulted_beats_done() {
        assert_eq!(derive_status(true, true, 0), JobStatus::Faulted);
    }

    #[test]
    fn done_beats_processing_count() {
        assert_eq!(derive_status(false, true, 3), JobStatus::Completed);
    }

    #[test]
    fn processing_requires_positive_count() {
        assert_eq!(derive_status(false, false, 1), JobStatus::Processing);
        assert_eq!(derive_status(false, false, 0), JobStatus::Queued);
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Faulted.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
    }
}
