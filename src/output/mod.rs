//! Output module for persisting records and reporting on a run
//!
//! This module handles:
//! - Writing accepted records as CSV
//! - Printing the run summary to the console
//! - Rendering the run summary as markdown

mod csv_output;
mod markdown;
pub mod stats;
mod traits;

pub use csv_output::{CsvSink, CSV_HEADERS};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{format_summary, print_summary};
pub use traits::{write_all, OutputError, OutputResult, RecordSink, RegionSummary, RunSummary};
