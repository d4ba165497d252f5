//! Output handler traits and types
//!
//! This module defines the trait interface for record sinks and the data
//! structures describing a finished run.

use crate::record::Record;
use crate::state::RegionState;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Per-region line of the run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSummary {
    /// Region code
    pub region: String,

    /// Configured target
    pub target: usize,

    /// Records accepted
    pub actual: usize,

    /// Why the region stopped
    pub state: RegionState,

    /// Pages requested
    pub pages_fetched: u32,
}

impl RegionSummary {
    /// Records short of the target
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.actual)
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub search_term: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    // Overall counts
    pub total_accepted: usize,
    pub rejected_duplicate: usize,
    pub rejected_validation: usize,

    /// Regions in crawl order
    pub regions: Vec<RegionSummary>,

    /// Regions never started because the run-wide cap was reached
    pub skipped_regions: Vec<String>,
}

impl RunSummary {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Sum of all region targets
    pub fn total_target(&self) -> usize {
        self.regions.iter().map(|r| r.target).sum()
    }

    /// Regions that ended below their target
    pub fn regions_short(&self) -> impl Iterator<Item = &RegionSummary> {
        self.regions.iter().filter(|r| r.shortfall() > 0)
    }

    /// Returns the percentage of the combined target that was collected
    pub fn attainment_rate(&self) -> f64 {
        let target = self.total_target();
        if target == 0 {
            return 0.0;
        }
        (self.total_accepted as f64 / target as f64) * 100.0
    }
}

/// Trait for record sinks
///
/// A sink receives the accepted records in order and persists them.
pub trait RecordSink {
    /// Writes one record
    fn write_record(&mut self, record: &Record) -> OutputResult<()>;

    /// Flushes anything buffered
    fn finish(&mut self) -> OutputResult<()>;
}

/// Writes every record to `sink` in order, then finishes it
///
/// # Returns
///
/// The number of records written
pub fn write_all<K: RecordSink + ?Sized>(sink: &mut K, records: &[Record]) -> OutputResult<usize> {
    for record in records {
        sink.write_record(record)?;
    }
    sink.finish()?;
    Ok(records.len())
}
