// src/store/mod.rs

//! Durable, idempotent job persistence.
//!
//! The store is the pipeline's only shared mutable resource. All writes go
//! through a single serialized path so concurrent upserts cannot violate
//! the id-uniqueness invariant, and a previously persisted job is never
//! dropped by a later failed fetch: upserts only add or refresh.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{JobPosting, JobStatus, ScoreResult};

pub use local::LocalJobStore;

/// Outcome of an upsert, keyed by the posting's stable external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New id; the posting was stored.
    Inserted,
    /// Known id with changed content; content refreshed, status and score
    /// history preserved.
    Updated,
    /// Known id with identical content; nothing written.
    Unchanged,
}

impl UpsertOutcome {
    /// Whether the id was already present.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Updated | Self::Unchanged)
    }
}

/// Keyed storage of job postings and their append-only score history.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or refresh a posting, keyed by its external id.
    async fn upsert(&self, job: &JobPosting) -> Result<UpsertOutcome>;

    /// Fetch one posting.
    async fn get(&self, id: &str) -> Result<Option<JobPosting>>;

    /// All postings still awaiting their first scoring.
    async fn list_unscored(&self) -> Result<Vec<JobPosting>>;

    /// All stored postings.
    async fn list_all(&self) -> Result<Vec<JobPosting>>;

    /// Postings whose latest overall score strictly exceeds the threshold.
    async fn list_passing(&self, threshold: f64) -> Result<Vec<(JobPosting, ScoreResult)>>;

    /// Append a score record. Never overwrites an earlier one.
    async fn record_score(&self, score: &ScoreResult) -> Result<()>;

    /// Latest score record for a posting, if any.
    async fn latest_score(&self, id: &str) -> Result<Option<ScoreResult>>;

    /// Advance a posting's lifecycle status.
    async fn set_status(&self, id: &str, status: JobStatus) -> Result<()>;

    /// Number of stored postings.
    async fn len(&self) -> Result<usize>;
}
