//! Site exclusion policy.
//!
//! URLs matching a configured pattern are never requested; the fetcher
//! records a skip event instead.

/// Substring blocklist consulted before each request.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    patterns: Vec<String>,
}

impl ExclusionPolicy {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect(),
        }
    }

    /// Returns the matching pattern if the URL is excluded.
    pub fn excluded_by(&self, url: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| url.contains(p.as_str()))
            .map(|p| p.as_str())
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded_by(url).is_some()
    }
}
