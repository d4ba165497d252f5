//! Listing-Sweep main entry point
//!
//! This is the command-line interface for the Listing-Sweep directory harvester.

use anyhow::Context;
use clap::Parser;
use listing_sweep::config::{load_config_with_hash, Config};
use listing_sweep::crawler::{build_search_url, run_sweep_into};
use listing_sweep::output::{generate_markdown_summary, print_summary, CsvSink};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Listing-Sweep: a polite business-directory harvester
///
/// Listing-Sweep pages through directory search results for one search term
/// across a list of regions, politely and one request at a time, and writes
/// every unique listing to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "listing-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A polite business-directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write records here instead of the configured CSV path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let csv_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));

    if cli.dry_run {
        handle_dry_run(&config, &csv_path)
    } else {
        handle_sweep(&config, &config_hash, &csv_path).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_sweep=info,warn"),
            1 => EnvFilter::new("listing_sweep=debug,info"),
            2 => EnvFilter::new("listing_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the plan
fn handle_dry_run(config: &Config, csv_path: &Path) -> anyhow::Result<()> {
    let base_url = Url::parse(&config.search.base_url).context("Invalid search base URL")?;
    let crawler = &config.crawler;

    println!("=== Listing-Sweep Dry Run ===\n");

    println!("Search:");
    println!("  Term: {}", config.search.term);
    println!("  Endpoint: {}", base_url);

    println!("\nCrawler Configuration:");
    println!("  Politeness interval: {}ms", crawler.politeness_interval_ms);
    println!(
        "  Timeouts: {}s request, {}s connect",
        crawler.request_timeout_secs, crawler.connect_timeout_secs
    );
    println!(
        "  Retries: {} (backoff {}ms..{}ms, 429 cooldown {}ms)",
        crawler.max_retries,
        crawler.backoff_base_ms,
        crawler.backoff_cap_ms,
        crawler.rate_limit_cooldown_ms
    );
    println!(
        "  Stop after {} empty page(s), {} page(s) without new records, or {} consecutive failure(s)",
        crawler.empty_page_threshold, crawler.stale_page_threshold, crawler.failure_threshold
    );
    println!("  Max pages per region: {}", crawler.max_pages_per_region);
    if let Some(max_total) = crawler.max_total_records {
        println!("  Max total records: {}", max_total);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", csv_path.display());
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    println!("\nRegions ({}):", config.regions.len());
    for region in &config.regions {
        let url = build_search_url(&base_url, &config.search.term, &region.code, 1);
        println!("  - {} (target {})", region.code, region.target);
        println!("    * {}", url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would collect up to {} records", config.planned_records());

    Ok(())
}

/// Handles the main sweep: crawl, write CSV, report
async fn handle_sweep(config: &Config, config_hash: &str, csv_path: &Path) -> anyhow::Result<()> {
    tracing::info!(
        "Sweeping '{}' across {} regions",
        config.search.term,
        config.regions.len()
    );

    let mut sink = CsvSink::create(csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    let outcome = run_sweep_into(config, &mut sink)
        .await
        .with_context(|| format!("Sweep into {} failed", csv_path.display()))?;
    tracing::info!(
        "Wrote {} records to {}",
        outcome.records.len(),
        csv_path.display()
    );

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_summary(&outcome.summary, config_hash, Path::new(summary_path))
            .with_context(|| format!("Failed to write summary {}", summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    print_summary(&outcome.summary);

    Ok(())
}
