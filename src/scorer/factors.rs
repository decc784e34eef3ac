//! The five sub-score heuristics.
//!
//! Every function here is pure: identical inputs always produce identical
//! scores, and every result lies in [0, 10].

use crate::models::{ClientSignals, JobPosting, Profile};
use crate::utils::text::{contains_phrase, keyword_set};

/// Fraction of profile skills found in the posting text, scaled to [0, 10].
///
/// Single-word skills are matched against the tokenized keyword set;
/// multi-word skills ("machine learning") are matched as phrases.
pub fn skills_match(job: &JobPosting, profile: &Profile) -> f64 {
    if profile.skills.is_empty() {
        return 0.0;
    }

    let text = format!("{} {}", job.title, job.description);
    let keywords = keyword_set(&text);

    let matched = profile
        .skills
        .iter()
        .filter(|skill| {
            let skill = skill.trim();
            if skill.contains(' ') {
                contains_phrase(&text, skill)
            } else {
                keywords.contains(&skill.to_lowercase())
            }
        })
        .count();

    (matched as f64 / profile.skills.len() as f64) * 10.0
}

/// Tier alignment: exact 10, adjacent 6, opposite ends 2, unstated 5.
pub fn experience_level(job: &JobPosting, profile: &Profile) -> f64 {
    match job.experience_level {
        None => 5.0,
        Some(required) => match required
            .rank()
            .abs_diff(profile.experience.rank())
        {
            0 => 10.0,
            1 => 6.0,
            _ => 2.0,
        },
    }
}

/// Budget fit against the profile's acceptable hourly range.
///
/// The posting's midpoint at or above the profile minimum is a full score;
/// below it the score falls proportionally. Missing budget is neutral.
pub fn budget(job: &JobPosting, profile: &Profile) -> f64 {
    match job.budget {
        None => 5.0,
        Some(range) => {
            let rate = range.midpoint();
            if rate >= profile.min_hourly_rate {
                10.0
            } else if profile.min_hourly_rate > 0.0 {
                (rate / profile.min_hourly_rate * 10.0).clamp(0.0, 10.0)
            } else {
                10.0
            }
        }
    }
}

/// Client quality from whichever history signals are present.
///
/// Absent signals do not drag the score down; they only reduce confidence
/// (handled by the scorer). With no signals at all the score is neutral.
pub fn client_history(client: &ClientSignals) -> f64 {
    let mut parts = Vec::with_capacity(3);

    if let Some(spent) = client.total_spent {
        parts.push(spend_score(spent));
    }
    if let Some(rating) = client.rating {
        parts.push((rating / 5.0 * 10.0).clamp(0.0, 10.0));
    }
    if let Some(hire_rate) = client.hire_rate {
        parts.push((hire_rate * 10.0).clamp(0.0, 10.0));
    }

    if parts.is_empty() {
        5.0
    } else {
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}

/// Spend tiers: an established client with real platform spend scores high.
fn spend_score(total_spent: f64) -> f64 {
    if total_spent >= 50_000.0 {
        10.0
    } else if total_spent >= 10_000.0 {
        8.0
    } else if total_spent >= 1_000.0 {
        6.0
    } else if total_spent > 0.0 {
        4.0
    } else {
        2.0
    }
}

/// Clarity/completeness heuristic on the description text.
///
/// Length tiers, paragraph structure, and requirement keywords raise the
/// score; haste markers lower it.
pub fn job_description(description: &str) -> f64 {
    if description.trim().is_empty() {
        return 0.0;
    }

    let mut score: f64 = 5.0;
    let len = description.chars().count();

    if len > 1000 {
        score += 2.0;
    } else if len > 500 {
        score += 1.0;
    } else if len < 100 {
        score -= 2.0;
    }

    if description.lines().filter(|l| !l.trim().is_empty()).count() > 3 {
        score += 1.0;
    }

    let lower = description.to_lowercase();
    if ["requirements", "deliverables", "timeline", "budget"]
        .iter()
        .any(|k| lower.contains(k))
    {
        score += 2.5;
    }

    if ["urgent", "asap", "cheap", "quick"].iter().any(|k| lower.contains(k)) {
        score -= 1.0;
    }

    score.clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetRange, ExperienceTier, JobStatus};
    use chrono::Utc;

    fn make_profile() -> Profile {
        Profile {
            skills: vec!["rust".into(), "python".into(), "machine learning".into()],
            experience: ExperienceTier::Intermediate,
            min_hourly_rate: 50.0,
            max_hourly_rate: 120.0,
        }
    }

    fn make_job(description: &str) -> JobPosting {
        JobPosting {
            id: "job_test".into(),
            title: "Developer wanted".into(),
            description: description.into(),
            link: "https://example.com/jobs/~test/".into(),
            budget: None,
            experience_level: None,
            job_type: None,
            duration: None,
            client: ClientSignals::default(),
            scraped_at: Utc::now(),
            content_hash: "hash".into(),
            low_confidence: false,
            status: JobStatus::New,
        }
    }

    #[test]
    fn test_skills_full_and_zero_overlap() {
        let profile = make_profile();

        let job = make_job("We need Rust and Python plus machine learning experience.");
        assert!((skills_match(&job, &profile) - 10.0).abs() < 1e-9);

        let job = make_job("Wordpress theme tweaks and logo design.");
        assert_eq!(skills_match(&job, &profile), 0.0);
    }

    #[test]
    fn test_skills_partial_overlap() {
        let profile = make_profile();
        let job = make_job("Rust backend work.");
        let score = skills_match(&job, &profile);
        assert!((score - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_experience_alignment_table() {
        let profile = make_profile(); // intermediate

        let mut job = make_job("x");
        job.experience_level = Some(ExperienceTier::Intermediate);
        assert_eq!(experience_level(&job, &profile), 10.0);

        job.experience_level = Some(ExperienceTier::Expert);
        assert_eq!(experience_level(&job, &profile), 6.0);

        job.experience_level = None;
        assert_eq!(experience_level(&job, &profile), 5.0);

        let mut entry_profile = make_profile();
        entry_profile.experience = ExperienceTier::Entry;
        job.experience_level = Some(ExperienceTier::Expert);
        assert_eq!(experience_level(&job, &entry_profile), 2.0);
    }

    #[test]
    fn test_budget_at_or_above_minimum_is_full() {
        let profile = make_profile();
        let mut job = make_job("x");

        job.budget = Some(BudgetRange { min: 50.0, max: 70.0 });
        assert_eq!(budget(&job, &profile), 10.0);

        job.budget = Some(BudgetRange { min: 20.0, max: 30.0 }); // midpoint 25
        assert!((budget(&job, &profile) - 5.0).abs() < 1e-9);

        job.budget = None;
        assert_eq!(budget(&job, &profile), 5.0);
    }

    #[test]
    fn test_client_history_ignores_absent_signals() {
        let full = ClientSignals {
            total_spent: Some(60_000.0),
            rating: Some(5.0),
            hire_rate: Some(1.0),
        };
        assert!((client_history(&full) - 10.0).abs() < 1e-9);

        // Only the rating is present; missing spend/hire-rate must not
        // drag the score down.
        let rating_only = ClientSignals {
            total_spent: None,
            rating: Some(5.0),
            hire_rate: None,
        };
        assert!((client_history(&rating_only) - 10.0).abs() < 1e-9);

        assert_eq!(client_history(&ClientSignals::default()), 5.0);
    }

    #[test]
    fn test_description_quality_tiers() {
        assert_eq!(job_description(""), 0.0);

        let sparse = "Need help.";
        assert!(job_description(sparse) < 5.0);

        let detailed = format!(
            "Project overview.\nRequirements: Rust, async.\nDeliverables: a service.\nTimeline: 6 weeks.\n{}",
            "Additional context. ".repeat(60)
        );
        assert!(job_description(&detailed) > 7.0);

        let hasty = "URGENT!! need this ASAP, cheap and quick.";
        assert!(job_description(hasty) < job_description("Need a considered solution for our data platform."));
    }

    #[test]
    fn test_all_factors_stay_in_range() {
        let profile = make_profile();
        let mut job = make_job(&"words ".repeat(400));
        job.budget = Some(BudgetRange { min: 0.0, max: 1.0 });
        job.client = ClientSignals {
            total_spent: Some(1e9),
            rating: Some(5.0),
            hire_rate: Some(1.0),
        };

        for value in [
            skills_match(&job, &profile),
            experience_level(&job, &profile),
            budget(&job, &profile),
            client_history(&job.client),
            job_description(&job.description),
        ] {
            assert!((0.0..=10.0).contains(&value), "out of range: {value}");
        }
    }
}
