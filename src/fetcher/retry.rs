//! Bounded retry with increasing backoff.
//!
//! A reusable policy injected into the fetcher rather than inlined: one
//! initial attempt plus up to `max_retries` retries, with an exponential,
//! capped delay between attempts.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. Total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): base * 2^retry, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Drive an async operation under this policy.
    ///
    /// Returns the first success, or the last error once retries are
    /// exhausted. The total attempt count is reported alongside either
    /// outcome so callers can log it per page.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> (u32, Result<T>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return (attempts, Ok(value)),
                Err(e) if attempts <= self.max_retries => {
                    let delay = self.delay_for(attempts - 1);
                    log::debug!(
                        "attempt {attempts} failed ({e}), retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (attempts, Err(e)),
            }
        }
    }
}
