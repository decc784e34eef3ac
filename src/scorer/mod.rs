// src/scorer/mod.rs

//! Weighted multi-factor job scoring.
//!
//! `JobScorer` combines five sub-scores into a weighted overall score,
//! estimates confidence from input completeness, and applies the
//! score/confidence gate. Scoring is deterministic: identical job, profile,
//! and weights always produce the same result.

pub mod factors;

use chrono::Utc;

use crate::models::{JobPosting, Profile, ScoreResult, ScoringConfig, SubScores};

/// Confidence deductions per missing input signal. Scoring never fails on
/// incomplete input; it reports lower confidence instead.
const SHORT_DESCRIPTION_PENALTY: f64 = 0.15;
const MISSING_BUDGET_PENALTY: f64 = 0.15;
const MISSING_CLIENT_SIGNAL_PENALTY: f64 = 0.1;
const MISSING_EXPERIENCE_PENALTY: f64 = 0.1;
const LOW_CONFIDENCE_PARSE_PENALTY: f64 = 0.1;

/// Description length below which confidence is reduced.
const SHORT_DESCRIPTION_CHARS: usize = 200;

/// Scoring service bound to one profile and one scoring configuration.
pub struct JobScorer {
    profile: Profile,
    config: ScoringConfig,
}

impl JobScorer {
    pub fn new(profile: Profile, config: ScoringConfig) -> Self {
        Self { profile, config }
    }

    /// Score one posting.
    pub fn score(&self, job: &JobPosting) -> ScoreResult {
        let sub_scores = SubScores {
            skills_match: factors::skills_match(job, &self.profile),
            experience_level: factors::experience_level(job, &self.profile),
            budget: factors::budget(job, &self.profile),
            client_history: factors::client_history(&job.client),
            job_description: factors::job_description(&job.description),
        };

        let overall_score = sub_scores
            .weighted(&self.config.weights)
            .clamp(0.0, 10.0);
        let confidence = self.confidence(job);

        let explanation = self
            .config
            .explanation_enabled
            .then(|| self.explain(job, &sub_scores, overall_score, confidence));

        ScoreResult {
            job_id: job.id.clone(),
            sub_scores,
            overall_score,
            confidence,
            explanation,
            created_at: Utc::now(),
        }
    }

    /// Pass/reject gate. Both boundaries are inclusive.
    pub fn passes(&self, result: &ScoreResult) -> bool {
        result.overall_score >= self.config.minimum_score
            && result.confidence >= self.config.confidence_threshold
    }

    /// Confidence from input completeness: each absent signal removes a
    /// fixed amount from 1.0.
    fn confidence(&self, job: &JobPosting) -> f64 {
        let mut deduction = 0.0;

        if job.description.chars().count() < SHORT_DESCRIPTION_CHARS {
            deduction += SHORT_DESCRIPTION_PENALTY;
        }
        if job.budget.is_none() {
            deduction += MISSING_BUDGET_PENALTY;
        }
        let missing_signals = 3 - job.client.present_count();
        deduction += missing_signals as f64 * MISSING_CLIENT_SIGNAL_PENALTY;
        if job.experience_level.is_none() {
            deduction += MISSING_EXPERIENCE_PENALTY;
        }
        if job.low_confidence {
            deduction += LOW_CONFIDENCE_PARSE_PENALTY;
        }

        (1.0 - deduction).clamp(0.0, 1.0)
    }

    fn explain(
        &self,
        job: &JobPosting,
        sub: &SubScores,
        overall: f64,
        confidence: f64,
    ) -> String {
        let verdict = if overall >= self.config.minimum_score
            && confidence >= self.config.confidence_threshold
        {
            "passes"
        } else if overall < self.config.minimum_score {
            "rejected on score"
        } else {
            "rejected on confidence"
        };
        format!(
            "{}: {:.1}/10 at {:.2} confidence ({verdict}; skills {:.1}, experience {:.1}, budget {:.1}, client {:.1}, description {:.1})",
            job.title,
            overall,
            confidence,
            sub.skills_match,
            sub.experience_level,
            sub.budget,
            sub.client_history,
            sub.job_description,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BudgetRange, ClientSignals, ExperienceTier, JobStatus, ScoreWeights,
    };

    fn make_profile() -> Profile {
        Profile {
            skills: vec!["rust".into(), "python".into()],
            experience: ExperienceTier::Intermediate,
            min_hourly_rate: 50.0,
            max_hourly_rate: 120.0,
        }
    }

    fn make_scorer() -> JobScorer {
        JobScorer::new(make_profile(), ScoringConfig::default())
    }

    fn rich_description() -> String {
        format!(
            "Overview of the project.\nRequirements: Rust services and Python tooling.\nDeliverables: production pipeline.\nTimeline: two months.\n{}",
            "More detail about the system and its constraints. ".repeat(30)
        )
    }

    fn complete_job() -> JobPosting {
        JobPosting {
            id: "job_full".into(),
            title: "Rust and Python pipeline".into(),
            description: rich_description(),
            link: "https://example.com/jobs/~full/".into(),
            budget: Some(BudgetRange { min: 60.0, max: 90.0 }),
            experience_level: Some(ExperienceTier::Intermediate),
            job_type: None,
            duration: None,
            client: ClientSignals {
                total_spent: Some(60_000.0),
                rating: Some(5.0),
                hire_rate: Some(0.9),
            },
            scraped_at: Utc::now(),
            content_hash: "hash".into(),
            low_confidence: false,
            status: JobStatus::New,
        }
    }

    fn make_result(overall: f64, confidence: f64) -> ScoreResult {
        ScoreResult {
            job_id: "job_x".into(),
            sub_scores: SubScores::default(),
            overall_score: overall,
            confidence,
            explanation: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let scorer = make_scorer();
        let result = scorer.score(&complete_job());
        assert!((0.0..=10.0).contains(&result.overall_score));
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_overall_is_weighted_sum_of_sub_scores() {
        let scorer = make_scorer();
        let result = scorer.score(&complete_job());
        let weights = ScoreWeights::default();
        let expected = result.sub_scores.weighted(&weights);
        assert!((result.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_complete_job_has_full_confidence() {
        let scorer = make_scorer();
        let result = scorer.score(&complete_job());
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_client_signals_lower_confidence_not_score() {
        let scorer = make_scorer();
        let full = scorer.score(&complete_job());

        let mut sparse_client = complete_job();
        sparse_client.client = ClientSignals {
            total_spent: None,
            rating: Some(5.0),
            hire_rate: None,
        };
        let sparse = scorer.score(&sparse_client);

        assert!(sparse.confidence < full.confidence);
        // Remaining signal is perfect, so the sub-score stays maximal.
        assert!((sparse.sub_scores.client_history - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_gate_boundaries_are_inclusive() {
        let scorer = make_scorer(); // minimum 7.0, confidence threshold 0.8
        assert!(scorer.passes(&make_result(7.0, 0.8)));
        assert!(!scorer.passes(&make_result(6.999, 0.8)));
        assert!(!scorer.passes(&make_result(7.0, 0.799)));
    }

    #[test]
    fn test_zero_skill_overlap_caps_overall_at_seven() {
        // skills_match weight is 0.3; with zero overlap the remaining
        // factors can contribute at most 0.7 × 10 = 7.0.
        let scorer = make_scorer();
        let mut job = complete_job();
        job.title = "Logo design".into();
        job.description = format!(
            "Brand identity work.\nRequirements: Illustrator.\nDeliverables: logo pack.\nTimeline: open.\n{}",
            "Detailed brand guidance for the design team. ".repeat(30)
        );

        let result = scorer.score(&job);
        assert_eq!(result.sub_scores.skills_match, 0.0);
        assert!(result.overall_score <= 7.0 + 1e-9);

        // Not every remaining factor is exactly maximal here (hire rate
        // 0.9 keeps client_history below 10), so the job must fall short
        // of the 7.0 minimum and be rejected.
        assert!(result.overall_score < 7.0);
        assert!(!scorer.passes(&result));
    }

    #[test]
    fn test_zero_skills_with_all_other_factors_maximal_hits_boundary() {
        let weights = ScoreWeights::default();
        let sub = SubScores {
            skills_match: 0.0,
            experience_level: 10.0,
            budget: 10.0,
            client_history: 10.0,
            job_description: 10.0,
        };
        let overall = sub.weighted(&weights);
        assert!((overall - 7.0).abs() < 1e-9);

        let scorer = make_scorer();
        assert!(scorer.passes(&make_result(overall, 1.0)));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = make_scorer();
        let job = complete_job();
        let a = scorer.score(&job);
        let b = scorer.score(&job);
        assert_eq!(a.sub_scores, b.sub_scores);
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.explanation, b.explanation);
    }

    #[test]
    fn test_explanation_respects_toggle() {
        let mut config = ScoringConfig::default();
        config.explanation_enabled = false;
        let silent = JobScorer::new(make_profile(), config);
        assert!(silent.score(&complete_job()).explanation.is_none());

        let verbose = make_scorer();
        let explanation = verbose.score(&complete_job()).explanation.unwrap();
        assert!(explanation.contains("/10"));
    }
}
