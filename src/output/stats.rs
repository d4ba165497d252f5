//! Console rendering of the run summary

use crate::output::traits::RunSummary;

/// Formats the run summary for terminal display
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![
        format!("=== Sweep Summary: '{}' ===", summary.search_term),
        String::new(),
        "Overview:".to_string(),
        format!("  Records accepted: {}", summary.total_accepted),
        format!("  Duplicates dropped: {}", summary.rejected_duplicate),
        format!("  Invalid listings dropped: {}", summary.rejected_validation),
        format!("  Duration: {}s", summary.duration_seconds()),
        String::new(),
        "Regions:".to_string(),
    ];

    lines.extend(summary.regions.iter().map(|region| {
        format!(
            "  {:<6} {:>5}/{:<5} {:<10} ({} pages)",
            region.region, region.actual, region.target, region.state, region.pages_fetched
        )
    }));
    lines.push(String::new());

    let short: Vec<_> = summary.regions_short().collect();
    if !short.is_empty() {
        lines.push(format!("Shortfalls ({}):", short.len()));
        lines.extend(short.iter().map(|region| {
            format!(
                "  - {}: {} short ({})",
                region.region,
                region.shortfall(),
                region.state
            )
        }));
        lines.push(String::new());
    }

    if !summary.skipped_regions.is_empty() {
        lines.push(format!(
            "Skipped after record cap: {}",
            summary.skipped_regions.join(", ")
        ));
        lines.push(String::new());
    }

    lines.push(format!(
        "Attainment: {:.1}% ({} / {} records)",
        summary.attainment_rate(),
        summary.total_accepted,
        summary.total_target()
    ));

    lines.join("\n")
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("{}", format_summary(summary));
}
