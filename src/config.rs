// src/config.rs

//! Configuration loading utilities.
//!
//! This module provides convenience functions for loading configuration
//! and the operator profile from files.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, Profile};

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails; a malformed config file should
/// not keep the pipeline from running with sane settings.
pub fn load_config(path: &Path) -> Config {
    Config::load_or_default(path)
}

/// Load the operator profile from a TOML file.
///
/// Unlike the config, the profile has no usable default: scoring is
/// meaningless without skills and a budget range, so failures are fatal.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let profile = Profile::load(path)?;
    profile.validate()?;
    Ok(profile)
}

/// Load and validate both config and profile.
pub fn load_all(base_path: &Path) -> Result<(Config, Profile)> {
    let config = load_config(&base_path.join("config.toml"));
    config
        .validate()
        .map_err(|e| AppError::config(format!("invalid configuration: {e}")))?;

    let profile = load_profile(&base_path.join("profile.toml"))?;

    Ok((config, profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("missing.toml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_all_requires_profile() {
        let tmp = TempDir::new().unwrap();
        assert!(load_all(tmp.path()).is_err());
    }

    #[test]
    fn test_load_all_with_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[run]\nmax_jobs_per_run = 3\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("profile.toml"),
            r#"
skills = ["rust", "python"]
experience = "intermediate"
min_hourly_rate = 50.0
max_hourly_rate = 100.0
"#,
        )
        .unwrap();

        let (config, profile) = load_all(tmp.path()).unwrap();
        assert_eq!(config.run.max_jobs_per_run, 3);
        assert_eq!(profile.skills.len(), 2);
    }

    #[test]
    fn test_load_all_rejects_invalid_weights() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[scoring.weights]\nskills_match = 0.9\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("profile.toml"),
            r#"
skills = ["rust"]
experience = "expert"
min_hourly_rate = 60.0
max_hourly_rate = 90.0
"#,
        )
        .unwrap();

        let err = load_all(tmp.path()).unwrap_err();
        assert!(err.is_fatal());
    }
}
