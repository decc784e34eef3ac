// src/error.rs

//! Unified error handling for the job pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error. Aborts the run before any fetching.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator profile error. Aborts the run before any fetching.
    #[error("Profile error: {0}")]
    Profile(String),

    /// Transient page fetch failure. Retried by the fetcher's retry policy;
    /// once retries are exhausted the page is recorded failed and skipped.
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Per-page parse failure. Yields zero records, never aborts the run.
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Concurrent write collision inside the store. Resolved by bounded
    /// retry; surfaces only if the collision persists.
    #[error("Store conflict: {0}")]
    StoreConflict(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a profile error.
    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile(message.into())
    }

    /// Create a transient fetch error with the offending URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a store conflict error.
    pub fn store_conflict(message: impl Into<String>) -> Self {
        Self::StoreConflict(message.into())
    }

    /// Whether this error aborts an entire run. Everything else is isolated
    /// per page/job and surfaces only in run-summary counts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Profile(_))
    }
}
