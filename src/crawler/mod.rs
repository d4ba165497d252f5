//! Crawler module for result-page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with politeness delays and retry logic
//! - Listing extraction from result pages
//! - Per-region pagination control
//! - Overall run coordination across regions

mod controller;
mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;

pub use controller::{crawl_region, RegionReport};
pub use coordinator::{run_sweep, run_sweep_into, Coordinator, RunOutcome};
pub use fetcher::{
    build_http_client, build_search_url, fetch_url, FailureKind, FetchResult, HttpFetcher,
    PageSource, RetryPolicy, SearchRequest,
};
pub use parser::{parse_result_page, ResultPage};
pub use rate_limiter::PolitenessLimiter;
