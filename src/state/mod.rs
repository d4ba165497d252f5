//! State module for tracking per-region crawl progress
//!
//! # Components
//!
//! - `RegionState`: where a region's crawl is (active, or one of three terminal states)
//! - `RegionProgress`: per-region counters that drive the state transitions
//! - `CrawlLimits`: the thresholds those transitions are judged against

mod region_state;

// Re-export main types
pub use region_state::{CrawlLimits, PageObservation, RegionProgress, RegionState};
