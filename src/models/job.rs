//! Job posting data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::ExperienceTier;

/// Lifecycle status of a stored posting. The only field that changes after
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Scored,
    Rejected,
    Passed,
}

/// Payment structure of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Fixed,
    Hourly,
}

impl JobType {
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("hourly") {
            Some(Self::Hourly)
        } else if lower.contains("fixed") {
            Some(Self::Fixed)
        } else {
            None
        }
    }
}

/// Budget range in dollars. For hourly jobs this is the advertised rate
/// range; fixed budgets are normalized to an hourly equivalent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

impl BudgetRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Client-history signals scraped alongside a posting. Absent signals stay
/// `None`; they lower scoring confidence, never the score itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientSignals {
    /// Total amount the client has spent on the platform, in dollars
    pub total_spent: Option<f64>,

    /// Average review rating, 0-5
    pub rating: Option<f64>,

    /// Fraction of posted jobs that led to a hire, 0-1
    pub hire_rate: Option<f64>,
}

impl ClientSignals {
    /// How many of the three signals are present.
    pub fn present_count(&self) -> usize {
        [
            self.total_spent.is_some(),
            self.rating.is_some(),
            self.hire_rate.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count()
    }
}

/// A structured job posting extracted from a scraped listing.
///
/// Immutable after creation except for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Stable external id derived from the listing URL
    pub id: String,

    /// Posting title
    pub title: String,

    /// Full description text
    pub description: String,

    /// Absolute URL of the listing
    pub link: String,

    /// Advertised budget, hourly-equivalent
    pub budget: Option<BudgetRange>,

    /// Required experience tier, if stated
    pub experience_level: Option<ExperienceTier>,

    /// Fixed or hourly engagement, if stated
    pub job_type: Option<JobType>,

    /// Stated engagement duration, if any
    pub duration: Option<String>,

    /// Client-history signals
    #[serde(default)]
    pub client: ClientSignals,

    /// When the posting was scraped
    pub scraped_at: DateTime<Utc>,

    /// SHA-256 of the raw tile content, for change detection
    pub content_hash: String,

    /// Set when required fields were missing at parse time
    #[serde(default)]
    pub low_confidence: bool,

    /// Lifecycle status
    pub status: JobStatus,
}
