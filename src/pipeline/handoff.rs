//! Downstream handoff seam.
//!
//! Jobs that clear the gate leave the pipeline through this trait. The
//! cover-letter and interview-preparation generators live outside this
//! crate and plug in here.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{JobPosting, ScoreResult};

/// Consumer of gate-passing postings.
#[async_trait]
pub trait Handoff: Send + Sync {
    /// Receive the ordered matches of one run (best score first).
    async fn deliver(&self, matches: &[(JobPosting, ScoreResult)]) -> Result<()>;
}

/// Default collaborator: summarizes matches to the log.
#[derive(Debug, Default)]
pub struct LogHandoff;

#[async_trait]
impl Handoff for LogHandoff {
    async fn deliver(&self, matches: &[(JobPosting, ScoreResult)]) -> Result<()> {
        for (job, score) in matches {
            log::info!(
                "match: {} ({:.1}/10 at {:.2} confidence) {}",
                job.title,
                score.overall_score,
                score.confidence,
                job.link
            );
        }
        Ok(())
    }
}
