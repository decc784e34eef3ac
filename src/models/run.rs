//! Run-level bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics and failure reasons for one pipeline execution.
///
/// Created and closed by the orchestrator exactly once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Timestamp-derived run identifier
    pub run_id: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Postings extracted from fetched pages
    pub scraped: usize,

    /// Upserts that hit an already-stored id
    pub duplicates: usize,

    /// Postings scored this run
    pub scored: usize,

    /// Postings that cleared the gate
    pub passed: usize,

    /// Pages or jobs that failed and were skipped
    pub failed: usize,

    /// Reasons attached to the failed count
    pub failures: Vec<String>,
}

impl PipelineRun {
    /// Open a new run.
    pub fn begin() -> Self {
        let started_at = Utc::now();
        Self {
            run_id: format!("run-{}", started_at.format("%Y%m%d%H%M%S%3f")),
            started_at,
            finished_at: None,
            scraped: 0,
            duplicates: 0,
            scored: 0,
            passed: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    /// Record a non-fatal failure with its reason.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push(reason.into());
    }

    /// Close the run.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Key/value pairs for the run summary log.
    pub fn summary_items(&self) -> Vec<(&'static str, String)> {
        vec![
            ("scraped", self.scraped.to_string()),
            ("duplicates", self.duplicates.to_string()),
            ("scored", self.scored.to_string()),
            ("passed", self.passed.to_string()),
            ("failed", self.failed.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_recording() {
        let mut run = PipelineRun::begin();
        run.record_failure("page 3: timeout");
        run.record_failure("job abc: empty description");
        assert_eq!(run.failed, 2);
        assert_eq!(run.failures.len(), 2);
    }

    #[test]
    fn test_finish_stamps_end_time() {
        let mut run = PipelineRun::begin();
        assert!(run.finished_at.is_none());
        run.finish();
        assert!(run.finished_at.is_some());
    }
}
