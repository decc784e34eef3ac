// src/fetcher/mod.rs

//! Listing page retrieval.
//!
//! Fetches search-result pages under a bounded worker pool. Every request
//! passes the shared rate gate, carries a rotated user agent, and is
//! wrapped in a per-page timeout; transient failures go through the
//! injected retry policy. A page that exhausts its retries becomes a
//! failure event and is skipped, never fatal to the run.

pub mod exclude;
pub mod rate;
pub mod retry;

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::USER_AGENT;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

pub use exclude::ExclusionPolicy;
pub use rate::RateGate;
pub use retry::RetryPolicy;

/// A successfully fetched raw listing page.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub page: u32,
    pub url: String,
    pub body: String,
}

/// Terminal outcome of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Fetched,
    Failed(String),
    Skipped(String),
}

/// Per-page event emitted for the orchestrator's aggregate reporting.
#[derive(Debug, Clone)]
pub struct PageEvent {
    pub page: u32,
    pub url: String,
    pub attempts: u32,
    pub outcome: PageOutcome,
}

/// Result of one fetch pass.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Fetched pages, ordered by page number
    pub pages: Vec<RawPage>,
    /// One event per requested page
    pub events: Vec<PageEvent>,
}

impl FetchOutcome {
    pub fn failed_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.outcome, PageOutcome::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.outcome, PageOutcome::Skipped(_)))
            .count()
    }
}

/// Source of raw listing pages.
///
/// The orchestrator depends on this seam rather than on the HTTP fetcher
/// directly, so tests (and alternative backends) can supply canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, query: &str, page_range: RangeInclusive<u32>) -> FetchOutcome;
}

/// HTTP fetcher for listing pages.
pub struct ListingFetcher {
    client: Client,
    search_url: String,
    max_concurrent: usize,
    page_timeout: Duration,
    retry: RetryPolicy,
    rate_gate: Arc<RateGate>,
    exclusion: ExclusionPolicy,
    user_agents: Vec<String>,
    ua_cursor: AtomicUsize,
}

impl ListingFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        if config.user_agents.is_empty() {
            return Err(AppError::config("fetcher.user_agents must not be empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            max_concurrent: config.max_concurrent.max(1),
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            retry: RetryPolicy::new(
                config.max_page_retries,
                Duration::from_millis(config.retry_base_delay_ms),
            ),
            rate_gate: Arc::new(RateGate::new(Duration::from_millis(config.request_delay_ms))),
            exclusion: ExclusionPolicy::new(config.exclude_patterns.clone()),
            user_agents: config.user_agents.clone(),
            ua_cursor: AtomicUsize::new(0),
        })
    }

    /// Build the listing URL for a query and page number.
    fn page_url(&self, query: &str, page: u32) -> Result<String> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let raw = self
            .search_url
            .replace("{query}", &encoded)
            .replace("{page}", &page.to_string());
        let parsed = url::Url::parse(&raw)?;
        Ok(parsed.into())
    }

    /// Next user agent, round-robin.
    fn next_user_agent(&self) -> String {
        let i = self.ua_cursor.fetch_add(1, Ordering::Relaxed);
        self.user_agents[i % self.user_agents.len()].clone()
    }

    /// Fetch one page body through the rate gate, timeout, and retry policy.
    async fn fetch_page(&self, url: &str) -> (u32, Result<String>) {
        self.retry
            .run(|| {
                let client = self.client.clone();
                let gate = Arc::clone(&self.rate_gate);
                let timeout = self.page_timeout;
                let agent = self.next_user_agent();
                let url = url.to_string();
                async move {
                    gate.wait().await;
                    let response =
                        tokio::time::timeout(timeout, client.get(&url).header(USER_AGENT, agent).send())
                            .await
                            .map_err(|_| {
                                AppError::fetch(&url, format!("timed out after {}s", timeout.as_secs()))
                            })?
                            .map_err(AppError::from)?
                            .error_for_status()
                            .map_err(AppError::from)?;
                    let body = tokio::time::timeout(timeout, response.text())
                        .await
                        .map_err(|_| AppError::fetch(&url, "timed out reading body"))?
                        .map_err(AppError::from)?;
                    Ok(body)
                }
            })
            .await
    }

    /// Resolve one page to its event (and body, when fetched).
    async fn run_page(&self, query: &str, page: u32) -> (Option<RawPage>, PageEvent) {
        let url = match self.page_url(query, page) {
            Ok(url) => url,
            Err(e) => {
                return (
                    None,
                    PageEvent {
                        page,
                        url: self.search_url.clone(),
                        attempts: 0,
                        outcome: PageOutcome::Failed(format!("bad URL: {e}")),
                    },
                );
            }
        };

        if let Some(pattern) = self.exclusion.excluded_by(&url) {
            return (
                None,
                PageEvent {
                    page,
                    url,
                    attempts: 0,
                    outcome: PageOutcome::Skipped(format!("excluded by pattern '{pattern}'")),
                },
            );
        }

        let (attempts, result) = self.fetch_page(&url).await;
        match result {
            Ok(body) => (
                Some(RawPage {
                    page,
                    url: url.clone(),
                    body,
                }),
                PageEvent {
                    page,
                    url,
                    attempts,
                    outcome: PageOutcome::Fetched,
                },
            ),
            Err(e) => {
                log::warn!("page {page} failed after {attempts} attempts: {e}");
                (
                    None,
                    PageEvent {
                        page,
                        url,
                        attempts,
                        outcome: PageOutcome::Failed(e.to_string()),
                    },
                )
            }
        }
    }
}

#[async_trait]
impl PageSource for ListingFetcher {
    /// Fetch all pages in the range concurrently, bounded by the worker
    /// limit. Arrival order is not meaningful; pages are re-sorted by page
    /// number before returning.
    async fn fetch(&self, query: &str, page_range: RangeInclusive<u32>) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        let mut page_stream = stream::iter(page_range)
            .map(|page| self.run_page(query, page))
            .buffer_unordered(self.max_concurrent);

        while let Some((raw, event)) = page_stream.next().await {
            if let Some(raw) = raw {
                outcome.pages.push(raw);
            }
            outcome.events.push(event);
        }

        outcome.pages.sort_by_key(|p| p.page);
        outcome.events.sort_by_key(|e| e.page);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetcherConfig;

    fn make_fetcher(config: &FetcherConfig) -> ListingFetcher {
        ListingFetcher::new(config).unwrap()
    }

    #[test]
    fn test_page_url_substitutes_and_encodes() {
        let fetcher = make_fetcher(&FetcherConfig::default());
        let url = fetcher.page_url("AI agent Developer", 2).unwrap();
        assert!(url.contains("q=AI+agent+Developer"));
        assert!(url.contains("page=2"));
    }

    #[test]
    fn test_user_agent_rotation_cycles() {
        let mut config = FetcherConfig::default();
        config.user_agents = vec!["ua-a".into(), "ua-b".into()];
        let fetcher = make_fetcher(&config);
        assert_eq!(fetcher.next_user_agent(), "ua-a");
        assert_eq!(fetcher.next_user_agent(), "ua-b");
        assert_eq!(fetcher.next_user_agent(), "ua-a");
    }

    #[tokio::test]
    async fn test_excluded_page_is_skipped_without_request() {
        let mut config = FetcherConfig::default();
        config.exclude_patterns = vec!["upwork.com".into()];
        let fetcher = make_fetcher(&config);

        let outcome = fetcher.fetch("rust", 1..=2).await;
        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.skipped_count(), 2);
        assert!(outcome
            .events
            .iter()
            .all(|e| matches!(e.outcome, PageOutcome::Skipped(_)) && e.attempts == 0));
    }

    #[tokio::test]
    async fn test_unparseable_search_url_is_a_failed_event() {
        let mut config = FetcherConfig::default();
        config.search_url = "not a url q={query} p={page}".into();
        let fetcher = make_fetcher(&config);

        let outcome = fetcher.fetch("rust", 1..=1).await;
        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.failed_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_page_exhausts_retries_without_aborting() {
        let mut config = FetcherConfig::default();
        // Nothing listens on the discard port; every attempt fails fast.
        config.search_url = "http://127.0.0.1:9/jobs?q={query}&page={page}".into();
        config.max_page_retries = 3;
        config.retry_base_delay_ms = 1;
        config.request_delay_ms = 0;
        config.page_timeout_secs = 2;
        let fetcher = make_fetcher(&config);

        let outcome = fetcher.fetch("rust", 1..=1).await;
        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.failed_count(), 1);
        // 1 initial attempt + 3 retries
        assert_eq!(outcome.events[0].attempts, 4);
    }
}
