//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Tolerance for the scoring weight-sum invariant.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and listing retrieval settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Scoring thresholds and factor weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Job store location and backup settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Run-level policy (job cap, batching, recurrence)
    #[serde(default)]
    pub run: RunConfig,

    /// CSS selectors for listing pages
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values.
    ///
    /// An invalid weight set is the one configuration error that must abort
    /// a run before any fetching begins.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.max_concurrent == 0 {
            return Err(AppError::config("fetcher.max_concurrent must be > 0"));
        }
        if self.fetcher.page_timeout_secs == 0 {
            return Err(AppError::config("fetcher.page_timeout_secs must be > 0"));
        }
        if self.fetcher.user_agents.is_empty() {
            return Err(AppError::config("fetcher.user_agents must not be empty"));
        }
        if !self.fetcher.search_url.contains("{query}") {
            return Err(AppError::config(
                "fetcher.search_url must contain a {query} placeholder",
            ));
        }
        if self.run.batch_size == 0 {
            return Err(AppError::config("run.batch_size must be > 0"));
        }
        if self.run.max_jobs_per_run == 0 {
            return Err(AppError::config("run.max_jobs_per_run must be > 0"));
        }
        if !(0.0..=10.0).contains(&self.scoring.minimum_score) {
            return Err(AppError::config(
                "scoring.minimum_score must be within [0, 10]",
            ));
        }
        if !(0.0..=1.0).contains(&self.scoring.confidence_threshold) {
            return Err(AppError::config(
                "scoring.confidence_threshold must be within [0, 1]",
            ));
        }
        self.scoring.weights.validate()?;
        Ok(())
    }
}

/// HTTP client and listing retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Search URL template with `{query}` and `{page}` placeholders
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Number of listing pages requested per run
    #[serde(default = "defaults::pages_per_run")]
    pub pages_per_run: u32,

    /// Maximum concurrent page fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Per-page fetch timeout in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Retries per page after the initial attempt
    #[serde(default = "defaults::max_page_retries")]
    pub max_page_retries: u32,

    /// Base delay for retry backoff in milliseconds
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Minimum delay between any two requests, shared across workers
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// User-Agent values rotated across requests
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// URL substrings that must never be requested
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            pages_per_run: defaults::pages_per_run(),
            max_concurrent: defaults::max_concurrent(),
            page_timeout_secs: defaults::page_timeout(),
            max_page_retries: defaults::max_page_retries(),
            retry_base_delay_ms: defaults::retry_base_delay(),
            request_delay_ms: defaults::request_delay(),
            user_agents: defaults::user_agents(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Scoring thresholds and per-factor weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum overall score for a job to pass the gate (0-10, inclusive)
    #[serde(default = "defaults::minimum_score")]
    pub minimum_score: f64,

    /// Minimum confidence for a job to pass the gate (0-1, inclusive)
    #[serde(default = "defaults::confidence_threshold")]
    pub confidence_threshold: f64,

    /// Attach a human-readable explanation to each score
    #[serde(default = "defaults::explanation_enabled")]
    pub explanation_enabled: bool,

    /// Per-factor weights, must sum to 1.0
    #[serde(default)]
    pub weights: ScoreWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minimum_score: defaults::minimum_score(),
            confidence_threshold: defaults::confidence_threshold(),
            explanation_enabled: defaults::explanation_enabled(),
            weights: ScoreWeights::default(),
        }
    }
}

/// Weights applied to the five scoring factors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    #[serde(default = "defaults::weight_skills_match")]
    pub skills_match: f64,
    #[serde(default = "defaults::weight_experience_level")]
    pub experience_level: f64,
    #[serde(default = "defaults::weight_budget")]
    pub budget: f64,
    #[serde(default = "defaults::weight_client_history")]
    pub client_history: f64,
    #[serde(default = "defaults::weight_job_description")]
    pub job_description: f64,
}

impl ScoreWeights {
    /// Sum of all five weights.
    pub fn sum(&self) -> f64 {
        self.skills_match
            + self.experience_level
            + self.budget
            + self.client_history
            + self.job_description
    }

    /// The weights must be non-negative and sum to 1.0 within tolerance.
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.skills_match,
            self.experience_level,
            self.budget,
            self.client_history,
            self.job_description,
        ];
        if all.iter().any(|w| *w < 0.0) {
            return Err(AppError::config("scoring weights must be non-negative"));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AppError::config(format!(
                "scoring weights must sum to 1.0, got {sum:.6}"
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            skills_match: defaults::weight_skills_match(),
            experience_level: defaults::weight_experience_level(),
            budget: defaults::weight_budget(),
            client_history: defaults::weight_client_history(),
            job_description: defaults::weight_job_description(),
        }
    }
}

/// Job store location and backup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding jobs.json, scores.json and backups/
    #[serde(default = "defaults::store_path")]
    pub path: String,

    /// Seconds between checkpoint backups (0 = snapshot on every write)
    #[serde(default = "defaults::backup_interval")]
    pub backup_interval_secs: u64,

    /// Number of backup snapshots retained
    #[serde(default = "defaults::max_backups")]
    pub max_backups: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
            backup_interval_secs: defaults::backup_interval(),
            max_backups: defaults::max_backups(),
        }
    }
}

/// Run-level policy. Only the orchestrator reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Default search query when the CLI does not supply one
    #[serde(default = "defaults::query")]
    pub query: String,

    /// Maximum new postings pulled per run
    #[serde(default = "defaults::max_jobs_per_run")]
    pub max_jobs_per_run: usize,

    /// Jobs scored per batch
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Hours between recurring runs
    #[serde(default = "defaults::interval_hours")]
    pub interval_hours: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            query: defaults::query(),
            max_jobs_per_run: defaults::max_jobs_per_run(),
            batch_size: defaults::batch_size(),
            interval_hours: defaults::interval_hours(),
        }
    }
}

/// CSS selectors for job tiles on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for one job tile
    #[serde(default = "defaults::tile_selector")]
    pub tile: String,

    /// Title element inside a tile
    #[serde(default = "defaults::title_selector")]
    pub title: String,

    /// Link element inside a tile (href attribute)
    #[serde(default = "defaults::link_selector")]
    pub link: String,

    /// Description element inside a tile
    #[serde(default = "defaults::description_selector")]
    pub description: String,

    /// Payment/budget element inside a tile
    #[serde(default = "defaults::budget_selector")]
    pub budget: String,

    /// Experience level element inside a tile
    #[serde(default = "defaults::experience_selector")]
    pub experience: String,

    /// Job type element inside a tile (fixed / hourly)
    #[serde(default = "defaults::job_type_selector")]
    pub job_type: String,

    /// Duration element inside a tile
    #[serde(default = "defaults::duration_selector")]
    pub duration: String,

    /// Client total spend element inside a tile
    #[serde(default = "defaults::client_spent_selector")]
    pub client_spent: String,

    /// Client rating element inside a tile
    #[serde(default = "defaults::client_rating_selector")]
    pub client_rating: String,

    /// Client hire rate element inside a tile
    #[serde(default = "defaults::client_hire_rate_selector")]
    pub client_hire_rate: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            tile: defaults::tile_selector(),
            title: defaults::title_selector(),
            link: defaults::link_selector(),
            description: defaults::description_selector(),
            budget: defaults::budget_selector(),
            experience: defaults::experience_selector(),
            job_type: defaults::job_type_selector(),
            duration: defaults::duration_selector(),
            client_spent: defaults::client_spent_selector(),
            client_rating: defaults::client_rating_selector(),
            client_hire_rate: defaults::client_hire_rate_selector(),
        }
    }
}

mod defaults {
    // Fetcher defaults
    pub fn search_url() -> String {
        "https://www.upwork.com/nx/search/jobs?q={query}&sort=recency&page={page}".into()
    }
    pub fn pages_per_run() -> u32 {
        2
    }
    pub fn max_concurrent() -> usize {
        10
    }
    pub fn page_timeout() -> u64 {
        60
    }
    pub fn max_page_retries() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        1000
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15".into(),
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".into(),
        ]
    }

    // Scoring defaults
    pub fn minimum_score() -> f64 {
        7.0
    }
    pub fn confidence_threshold() -> f64 {
        0.8
    }
    pub fn explanation_enabled() -> bool {
        true
    }
    pub fn weight_skills_match() -> f64 {
        0.30
    }
    pub fn weight_experience_level() -> f64 {
        0.20
    }
    pub fn weight_budget() -> f64 {
        0.25
    }
    pub fn weight_client_history() -> f64 {
        0.15
    }
    pub fn weight_job_description() -> f64 {
        0.10
    }

    // Store defaults
    pub fn store_path() -> String {
        "data/jobs".into()
    }
    pub fn backup_interval() -> u64 {
        86_400
    }
    pub fn max_backups() -> usize {
        7
    }

    // Run defaults
    pub fn query() -> String {
        "AI agent Developer".into()
    }
    pub fn max_jobs_per_run() -> usize {
        10
    }
    pub fn batch_size() -> usize {
        5
    }
    pub fn interval_hours() -> u64 {
        24
    }

    // Selector defaults
    pub fn tile_selector() -> String {
        "article.job-tile".into()
    }
    pub fn title_selector() -> String {
        "h2.job-tile-title".into()
    }
    pub fn link_selector() -> String {
        "h2.job-tile-title a".into()
    }
    pub fn description_selector() -> String {
        "p.job-description".into()
    }
    pub fn budget_selector() -> String {
        "span.payment-rate".into()
    }
    pub fn experience_selector() -> String {
        "span.experience-level".into()
    }
    pub fn job_type_selector() -> String {
        "span.job-type".into()
    }
    pub fn duration_selector() -> String {
        "span.duration".into()
    }
    pub fn client_spent_selector() -> String {
        "span.client-spent".into()
    }
    pub fn client_rating_selector() -> String {
        "span.client-rating".into()
    }
    pub fn client_hire_rate_selector() -> String {
        "span.client-hire-rate".into()
    }
}
