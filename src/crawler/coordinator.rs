//! Crawler coordinator - run orchestration
//!
//! This module contains the run loop that:
//! - Walks the configured regions in order
//! - Runs each region crawl to completion, sharing one deduplicator
//! - Applies the optional run-wide record cap
//! - Aggregates records and builds the run summary

use crate::config::{Config, RegionEntry};
use crate::crawler::controller::{crawl_region, RegionReport};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageSource, RetryPolicy};
use crate::crawler::rate_limiter::PolitenessLimiter;
use crate::output::{write_all, RecordSink, RegionSummary, RunSummary};
use crate::record::{Deduplicator, Record};
use crate::state::CrawlLimits;
use chrono::Utc;
use url::Url;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Accepted records in region order, then discovery order
    pub records: Vec<Record>,

    /// Per-region and overall counts
    pub summary: RunSummary,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: PageSource> {
    source: S,
    search_term: String,
    regions: Vec<RegionEntry>,
    limits: CrawlLimits,
    max_total_records: Option<usize>,
    dedup: Deduplicator,
}

impl Coordinator<HttpFetcher> {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SweepError)` - The HTTP client or base URL could not be set up
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let base_url = Url::parse(&config.search.base_url)?;
        let limiter = PolitenessLimiter::new(config.crawler.politeness_interval());
        let fetcher = HttpFetcher::new(
            client,
            base_url,
            RetryPolicy::from(&config.crawler),
            limiter,
        );

        Ok(Self::new(
            fetcher,
            &config.search.term,
            config.regions.clone(),
            CrawlLimits::from(&config.crawler),
        )
        .with_max_total_records(config.crawler.max_total_records))
    }
}

impl<S: PageSource> Coordinator<S> {
    /// Creates a coordinator over any page source
    pub fn new(source: S, search_term: &str, regions: Vec<RegionEntry>, limits: CrawlLimits) -> Self {
        Self {
            source,
            search_term: search_term.to_string(),
            regions,
            limits,
            max_total_records: None,
            dedup: Deduplicator::new(),
        }
    }

    /// Caps the number of records accepted across all regions
    pub fn with_max_total_records(mut self, cap: Option<usize>) -> Self {
        self.max_total_records = cap;
        self
    }

    /// Runs every region in order and returns the aggregate
    ///
    /// No region failure stops the run: an aborted region is reported as a
    /// shortfall and the next region starts.
    pub async fn run(mut self) -> RunOutcome {
        let started_at = Utc::now();
        tracing::info!(
            "Starting sweep for '{}' across {} regions",
            self.search_term,
            self.regions.len()
        );

        let mut records: Vec<Record> = Vec::new();
        let mut regions = Vec::new();
        let mut skipped_regions = Vec::new();
        let mut rejected_validation = 0;
        let mut rejected_duplicate = 0;

        for entry in &self.regions {
            let target = match self.max_total_records {
                Some(cap) => {
                    let remaining = cap.saturating_sub(records.len());
                    if remaining == 0 {
                        tracing::info!("Reached {} records limit, skipping {}", cap, entry.code);
                        skipped_regions.push(entry.code.clone());
                        continue;
                    }
                    entry.target.min(remaining)
                }
                None => entry.target,
            };

            tracing::info!("Processing region {} (target {})", entry.code, target);

            let report = crawl_region(
                &mut self.source,
                &mut self.dedup,
                &self.search_term,
                &entry.code,
                target,
                &self.limits,
            )
            .await;

            rejected_validation += report.rejected_validation;
            rejected_duplicate += report.rejected_duplicate;
            regions.push(summarize(&report, entry.target));
            records.extend(report.records);

            tracing::info!("Total records so far: {}", records.len());
        }

        let summary = RunSummary {
            search_term: self.search_term.clone(),
            started_at,
            finished_at: Utc::now(),
            total_accepted: records.len(),
            rejected_duplicate,
            rejected_validation,
            regions,
            skipped_regions,
        };

        tracing::info!(
            "Sweep finished: {} accepted, {} duplicates, {} invalid",
            summary.total_accepted,
            summary.rejected_duplicate,
            summary.rejected_validation
        );

        RunOutcome { records, summary }
    }
}

/// Reduces a region report to its summary line
///
/// `configured_target` is reported even when the run-wide cap lowered the
/// target the region was crawled against.
fn summarize(report: &RegionReport, configured_target: usize) -> RegionSummary {
    RegionSummary {
        region: report.region.clone(),
        target: configured_target,
        actual: report.actual(),
        state: report.state,
        pages_fetched: report.pages_fetched,
    }
}

/// Runs the whole sweep described by `config` over HTTP
///
/// # Example
///
/// ```no_run
/// use listing_sweep::config::load_config;
/// use listing_sweep::crawler::run_sweep;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// let outcome = run_sweep(&config).await?;
/// println!("{} records", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(config: &Config) -> crate::Result<RunOutcome> {
    let coordinator = Coordinator::from_config(config)?;
    Ok(coordinator.run().await)
}

/// Runs the sweep and writes the accepted records into an already-open `sink`
pub async fn run_sweep_into<K: RecordSink + ?Sized>(
    config: &Config,
    sink: &mut K,
) -> crate::Result<RunOutcome> {
    let outcome = run_sweep(config).await?;
    write_all(sink, &outcome.records)?;
    Ok(outcome)
}
