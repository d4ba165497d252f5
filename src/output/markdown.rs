//! Markdown summary generation
//!
//! This module renders a finished run as a human-readable markdown report:
//! run metadata, overall counts, and one table row per region.

use crate::output::traits::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
///
/// # Arguments
///
/// * `summary` - The run summary
/// * `config_hash` - Hash of the configuration file the run used
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    summary: &RunSummary,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary, config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# Listing Sweep Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Search Term**: {}\n", summary.search_term));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let duration = summary.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Records Accepted**: {}\n", summary.total_accepted));
    md.push_str(&format!("- **Combined Target**: {}\n", summary.total_target()));
    md.push_str(&format!(
        "- **Attainment**: {:.2}%\n",
        summary.attainment_rate()
    ));
    md.push_str(&format!(
        "- **Duplicates Dropped**: {}\n",
        summary.rejected_duplicate
    ));
    md.push_str(&format!(
        "- **Invalid Listings Dropped**: {}\n\n",
        summary.rejected_validation
    ));

    // Region breakdown
    md.push_str("## Regions\n\n");
    md.push_str("| Region | Target | Actual | Shortfall | Pages | Outcome |\n");
    md.push_str("|--------|--------|--------|-----------|-------|---------|\n");
    for region in &summary.regions {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            region.region,
            region.target,
            region.actual,
            region.shortfall(),
            region.pages_fetched,
            region.state
        ));
    }
    md.push('\n');

    if !summary.skipped_regions.is_empty() {
        md.push_str("## Skipped Regions\n\n");
        md.push_str("Not crawled because the run-wide record cap was reached:\n\n");
        for code in &summary.skipped_regions {
            md.push_str(&format!("- {}\n", code));
        }
        md.push('\n');
    }

    md
}
