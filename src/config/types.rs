use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Listing-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Regions in crawl order
    #[serde(default, rename = "region")]
    pub regions: Vec<RegionEntry>,
}

impl Config {
    /// Most records the run can produce: the combined region targets,
    /// lowered to `max-total-records` when that is set
    pub fn planned_records(&self) -> usize {
        let combined: usize = self.regions.iter().map(|r| r.target).sum();
        match self.crawler.max_total_records {
            Some(cap) => combined.min(cap),
            None => combined,
        }
    }
}

/// The fixed directory query
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search term sent with every request
    pub term: String,

    /// Search endpoint, without query string
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Minimum time between the end of one request and the start of the next (milliseconds)
    pub politeness_interval_ms: u64,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Retries allowed after the first attempt of a page
    pub max_retries: u32,

    /// First transient-failure backoff (milliseconds), doubled per retry
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    pub backoff_cap_ms: u64,

    /// Fixed wait after an HTTP 429 response (milliseconds)
    pub rate_limit_cooldown_ms: u64,

    /// Consecutive empty pages that end a region as exhausted
    pub empty_page_threshold: u32,

    /// Consecutive failed pages that abort a region
    pub failure_threshold: u32,

    /// Consecutive pages yielding no new records that end a region as exhausted
    pub stale_page_threshold: u32,

    /// Cap on pages fetched per region
    pub max_pages_per_region: u32,

    /// Optional cap on records accepted across the whole run
    pub max_total_records: Option<usize>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            politeness_interval_ms: 3000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 1000,
            backoff_cap_ms: 30_000,
            rate_limit_cooldown_ms: 20_000,
            empty_page_threshold: 1,
            failure_threshold: 3,
            stale_page_threshold: 3,
            max_pages_per_region: 100,
            max_total_records: None,
        }
    }
}

impl CrawlerConfig {
    pub fn politeness_interval(&self) -> Duration {
        Duration::from_millis(self.politeness_interval_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV dataset
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Optional path to the markdown run summary
    #[serde(default, rename = "summary-path")]
    pub summary_path: Option<String>,
}

/// A region to search, with the number of records we hope to collect
#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
    /// Region code sent as the location term (e.g., "FL")
    pub code: String,

    /// Target count of accepted records
    pub target: usize,
}
