//! Score records produced by the scorer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five independent sub-scores, each in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SubScores {
    pub skills_match: f64,
    pub experience_level: f64,
    pub budget: f64,
    pub client_history: f64,
    pub job_description: f64,
}

impl SubScores {
    /// Weighted sum against a weight set. Callers clamp to [0, 10].
    pub fn weighted(&self, weights: &crate::models::ScoreWeights) -> f64 {
        self.skills_match * weights.skills_match
            + self.experience_level * weights.experience_level
            + self.budget * weights.budget
            + self.client_history * weights.client_history
            + self.job_description * weights.job_description
    }
}

/// One scoring of one posting. Append-only: rescoring creates a new record,
/// never overwrites an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Id of the scored posting
    pub job_id: String,

    /// Factor breakdown
    pub sub_scores: SubScores,

    /// Weighted overall score, in [0, 10]
    pub overall_score: f64,

    /// Reliability of the score given input completeness, in [0, 1]
    pub confidence: f64,

    /// Human-readable reasoning, present when explanations are enabled
    pub explanation: Option<String>,

    /// When the score was computed
    pub created_at: DateTime<Utc>,
}
