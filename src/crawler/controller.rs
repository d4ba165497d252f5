//! Region crawl controller
//!
//! Drives pagination for a single region: fetch a page, parse it, normalize
//! and deduplicate its listings, then ask `RegionProgress` whether to keep
//! going. Page numbers advance by exactly one per fetched page, whether the
//! page succeeded, came back empty, or failed. A region that keeps serving
//! listings still ends: a page without a next link, a run of pages that add
//! nothing new, or the page cap each exhaust it.

use crate::crawler::fetcher::{PageSource, SearchRequest};
use crate::crawler::parser::parse_result_page;
use crate::record::{normalize, Deduplicator, Record};
use crate::state::{CrawlLimits, PageObservation, RegionProgress, RegionState};

/// Final report for one region
#[derive(Debug, Clone)]
pub struct RegionReport {
    /// Region code
    pub region: String,

    /// Target the region was crawled against
    pub target: usize,

    /// Accepted records in discovery order
    pub records: Vec<Record>,

    /// Terminal state
    pub state: RegionState,

    /// Pages requested
    pub pages_fetched: u32,

    /// Listings dropped by validation
    pub rejected_validation: usize,

    /// Listings dropped as duplicates
    pub rejected_duplicate: usize,
}

impl RegionReport {
    /// Number of accepted records
    pub fn actual(&self) -> usize {
        self.records.len()
    }

    /// Records short of the target (0 when completed)
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.actual())
    }
}

/// What a single page contributed to the region
#[derive(Debug, Default)]
struct PageYield {
    listings: usize,
    has_next: bool,
    records: Vec<Record>,
    rejected_validation: usize,
    rejected_duplicate: usize,
}

/// Crawls one region until it completes, runs dry, or is aborted
///
/// # Arguments
///
/// * `source` - Where pages come from (HTTP in production)
/// * `dedup` - The run-wide deduplicator
/// * `search_term` - The fixed search term
/// * `region` - Region code
/// * `target` - Records wanted from this region
/// * `limits` - Termination thresholds
pub async fn crawl_region<S: PageSource + ?Sized>(
    source: &mut S,
    dedup: &mut Deduplicator,
    search_term: &str,
    region: &str,
    target: usize,
    limits: &CrawlLimits,
) -> RegionReport {
    let mut progress = RegionProgress::new(target);
    let mut records = Vec::new();
    let mut rejected_validation = 0;
    let mut rejected_duplicate = 0;
    let mut page = 1u32;

    let state = loop {
        let request = SearchRequest::new(search_term, region, page);
        let result = source.fetch_page(&request).await;

        let observation = match result.body() {
            None => {
                tracing::warn!("{} page {}: fetch failed, treating page as empty", region, page);
                PageObservation::Failed
            }
            Some(body) => {
                let page_yield = process_page(body, region, dedup, progress.remaining());
                rejected_validation += page_yield.rejected_validation;
                rejected_duplicate += page_yield.rejected_duplicate;

                if page_yield.listings == 0 {
                    tracing::info!("{} page {}: no listings", region, page);
                    PageObservation::Empty
                } else {
                    let accepted = page_yield.records.len();
                    tracing::info!(
                        "{} page {}: {} listings, {} accepted ({} total)",
                        region,
                        page,
                        page_yield.listings,
                        accepted,
                        progress.accepted + accepted
                    );
                    records.extend(page_yield.records);
                    PageObservation::Listings {
                        accepted,
                        has_next: page_yield.has_next,
                    }
                }
            }
        };

        progress.observe(observation);

        let state = progress.next_state(limits);
        if state.is_terminal() {
            break state;
        }
        page += 1;
    };

    match state {
        RegionState::Completed => tracing::info!(
            "{}: completed with {}/{} records after {} pages",
            region,
            progress.accepted,
            target,
            progress.pages_fetched
        ),
        _ => tracing::warn!(
            "{}: {} with {}/{} records after {} pages",
            region,
            state,
            progress.accepted,
            target,
            progress.pages_fetched
        ),
    }

    RegionReport {
        region: region.to_string(),
        target,
        records,
        state,
        pages_fetched: progress.pages_fetched,
        rejected_validation,
        rejected_duplicate,
    }
}

/// Parses, validates and deduplicates one page
///
/// Stops admitting once `remaining` records have been accepted, so listings
/// past the target neither enter the result nor consume dedup keys.
fn process_page(
    body: &str,
    region: &str,
    dedup: &mut Deduplicator,
    remaining: usize,
) -> PageYield {
    let page = parse_result_page(body);
    let mut page_yield = PageYield {
        listings: page.listings.len(),
        has_next: page.has_next,
        ..PageYield::default()
    };

    for raw in page.listings {
        if page_yield.records.len() >= remaining {
            break;
        }

        let record = match normalize(raw, region) {
            Ok(record) => record,
            Err(reason) => {
                tracing::debug!("{}: rejected listing ({})", region, reason);
                page_yield.rejected_validation += 1;
                continue;
            }
        };

        if !dedup.admit(&record) {
            tracing::debug!("{}: duplicate listing '{}'", region, record.name);
            page_yield.rejected_duplicate += 1;
            continue;
        }

        page_yield.records.push(record);
    }

    page_yield
}
