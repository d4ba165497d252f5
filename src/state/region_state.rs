//! Region state definitions for tracking crawl progress
//!
//! A region crawl starts `Active` and ends in exactly one terminal state.
//! The transition is a pure function of `RegionProgress` and `CrawlLimits`,
//! so it can be exercised without any network access.

use crate::config::CrawlerConfig;
use std::fmt;

/// Represents the current state of a region crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionState {
    // ===== Active State =====
    /// More pages should be fetched
    Active,

    // ===== Terminal States =====
    /// Accepted-count reached the region's target
    Completed,

    /// The source ran out of new listings (or the page cap was hit) before the target
    Exhausted,

    /// Too many consecutive pages failed to fetch
    Aborted,
}

impl RegionState {
    /// Returns true if this is a terminal state (no further pages will be fetched)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What one fetched page contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageObservation {
    /// The fetcher gave up on the page
    Failed,

    /// The page loaded but held no listings
    Empty,

    /// The page held listings; `accepted` of them became new records and
    /// `has_next` tells whether the page linked to a following one
    Listings { accepted: usize, has_next: bool },
}

/// Thresholds that end a region crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Consecutive empty pages before `Exhausted`
    pub empty_page_threshold: u32,

    /// Consecutive failed pages before `Aborted`
    pub failure_threshold: u32,

    /// Consecutive pages with listings but no new records before `Exhausted`
    pub stale_page_threshold: u32,

    /// Pages fetched before the region is treated as `Exhausted`
    pub max_pages: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            empty_page_threshold: 1,
            failure_threshold: 3,
            stale_page_threshold: 3,
            max_pages: 100,
        }
    }
}

impl From<&CrawlerConfig> for CrawlLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            empty_page_threshold: config.empty_page_threshold,
            failure_threshold: config.failure_threshold,
            stale_page_threshold: config.stale_page_threshold,
            max_pages: config.max_pages_per_region,
        }
    }
}

/// Mutable counters for one region's crawl
///
/// Owned by the region crawl for its lifetime only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionProgress {
    /// Records this region must accept to be `Completed`
    pub target: usize,

    /// Pages requested so far (retries inside the fetcher are not counted)
    pub pages_fetched: u32,

    /// Records accepted for this region
    pub accepted: usize,

    /// Pages in a row that loaded with no listings
    pub consecutive_empty: u32,

    /// Pages in a row that failed to fetch
    pub consecutive_failures: u32,

    /// Pages in a row whose listings were all duplicates or invalid
    pub consecutive_stale: u32,

    /// The latest page had listings but no link to a following page
    pub reached_last_page: bool,
}

impl RegionProgress {
    /// Creates progress counters for a region with the given target
    pub fn new(target: usize) -> Self {
        Self {
            target,
            pages_fetched: 0,
            accepted: 0,
            consecutive_empty: 0,
            consecutive_failures: 0,
            consecutive_stale: 0,
            reached_last_page: false,
        }
    }

    /// Records that a page was fetched and what it yielded
    pub fn observe(&mut self, observation: PageObservation) {
        self.pages_fetched += 1;
        self.reached_last_page = false;

        match observation {
            PageObservation::Failed => {
                self.consecutive_failures += 1;
                self.consecutive_empty = 0;
            }
            PageObservation::Empty => {
                self.consecutive_empty += 1;
                self.consecutive_failures = 0;
            }
            PageObservation::Listings { accepted, has_next } => {
                self.accepted += accepted;
                self.consecutive_empty = 0;
                self.consecutive_failures = 0;
                self.reached_last_page = !has_next;
                if accepted == 0 {
                    self.consecutive_stale += 1;
                } else {
                    self.consecutive_stale = 0;
                }
            }
        }
    }

    /// Returns true once the accepted count has reached the target
    pub fn target_reached(&self) -> bool {
        self.accepted >= self.target
    }

    /// Records still needed to reach the target
    pub fn remaining(&self) -> usize {
        self.target.saturating_sub(self.accepted)
    }

    /// Decides the state after the latest observation
    ///
    /// # Precedence
    ///
    /// | Condition | State |
    /// |-----------|-------|
    /// | accepted >= target | Completed |
    /// | consecutive failures >= failure threshold | Aborted |
    /// | consecutive empty pages >= empty threshold | Exhausted |
    /// | last page had no next link | Exhausted |
    /// | consecutive stale pages >= stale threshold | Exhausted |
    /// | pages fetched >= page cap | Exhausted |
    /// | otherwise | Active |
    ///
    /// Every page either moves a counter toward a threshold or toward the
    /// page cap, so a region always terminates.
    pub fn next_state(&self, limits: &CrawlLimits) -> RegionState {
        if self.target_reached() {
            RegionState::Completed
        } else if self.consecutive_failures >= limits.failure_threshold {
            RegionState::Aborted
        } else if self.consecutive_empty >= limits.empty_page_threshold
            || self.reached_last_page
            || self.consecutive_stale >= limits.stale_page_threshold
            || self.pages_fetched >= limits.max_pages
        {
            RegionState::Exhausted
        } else {
            RegionState::Active
        }
    }
}
