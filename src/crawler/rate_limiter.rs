//! Run-wide politeness limiter
//!
//! Every outbound request of a run, whatever its region and whether it is a
//! first attempt or a retry, goes through one `PolitenessLimiter`. The gap is
//! measured from the end of the previous request to the start of the next.
//!
//! The limiter is a plain single-owner value handed to the fetcher. Running
//! regions concurrently would require wrapping it in a lock and sharing that.

use std::time::{Duration, Instant};

/// Enforces a minimum delay between consecutive requests
#[derive(Debug, Clone)]
pub struct PolitenessLimiter {
    /// Minimum gap between requests
    interval: Duration,

    /// When the previous request finished
    last_finished: Option<Instant>,
}

impl PolitenessLimiter {
    /// Creates a limiter with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: None,
        }
    }

    /// Calculates the time until the next request may start
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_finished?;
        let elapsed = now.saturating_duration_since(last);

        if elapsed >= self.interval {
            None
        } else {
            Some(self.interval - elapsed)
        }
    }

    /// Sleeps until the politeness interval since the last request has passed
    pub async fn wait_turn(&self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Politeness wait: {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Records that a request has just finished
    pub fn record_finished(&mut self, now: Instant) {
        self.last_finished = Some(now);
    }
}
