//! Shared request pacing.
//!
//! All fetch workers share one `RateGate`, so the inter-request delay is a
//! single global budget rather than independent per-worker timers.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// A reservation clock: each caller takes the next free slot and sleeps
/// until it arrives.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until this caller may issue a request.
    ///
    /// The slot is reserved while the lock is held, so concurrent callers
    /// are spaced `min_interval` apart in reservation order even though the
    /// sleep itself happens outside the lock.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_zero_interval_never_blocks() {
        let gate = RateGate::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            gate.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_concurrent_waits_are_spaced_globally() {
        let interval = Duration::from_millis(20);
        let gate = Arc::new(RateGate::new(interval));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.wait().await;
                Instant::now()
            }));
        }

        let mut times: Vec<Instant> = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        // First slot is immediate; the remaining three are serialized behind
        // one shared clock, so the last finishes at least 3 intervals in.
        assert!(times[3].duration_since(start) >= interval * 3);
        for pair in times.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= interval - Duration::from_millis(5));
        }
    }
}
