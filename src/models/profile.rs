//! Operator profile: the freelancer's skills, experience tier, and
//! acceptable budget range used as scoring input.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Experience tiers used by both postings and the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Entry,
    Intermediate,
    Expert,
}

impl ExperienceTier {
    /// Parse a free-form level string as scraped from a listing.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("entry") || lower.contains("beginner") {
            Some(Self::Entry)
        } else if lower.contains("intermediate") {
            Some(Self::Intermediate)
        } else if lower.contains("expert") || lower.contains("advanced") {
            Some(Self::Expert)
        } else {
            None
        }
    }

    /// Ordinal position, for tier distance.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Entry => 0,
            Self::Intermediate => 1,
            Self::Expert => 2,
        }
    }
}

/// The operator profile supplied by the external profile loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Skills offered, matched against posting descriptions
    pub skills: Vec<String>,

    /// The operator's experience tier
    pub experience: ExperienceTier,

    /// Lowest acceptable hourly rate in dollars
    pub min_hourly_rate: f64,

    /// Highest expected hourly rate in dollars
    pub max_hourly_rate: f64,
}

impl Profile {
    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::profile(format!("cannot read {:?}: {e}", path.as_ref()))
        })?;
        let profile: Profile = toml::from_str(&content)
            .map_err(|e| AppError::profile(format!("invalid profile: {e}")))?;
        Ok(profile)
    }

    /// Required profile fields must be present and sane. A failure here is
    /// fatal and aborts the run before any fetching.
    pub fn validate(&self) -> Result<()> {
        if self.skills.is_empty() {
            return Err(AppError::profile("profile must list at least one skill"));
        }
        if self.skills.iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::profile("profile skills must not be blank"));
        }
        if self.min_hourly_rate <= 0.0 {
            return Err(AppError::profile("min_hourly_rate must be > 0"));
        }
        if self.max_hourly_rate < self.min_hourly_rate {
            return Err(AppError::profile(
                "max_hourly_rate must be >= min_hourly_rate",
            ));
        }
        Ok(())
    }
}
