//! Docs-Mapper main entry point
//!
//! This is the command-line interface for the Docs-Mapper documentation site crawler.

use anyhow::Context;
use clap::Parser;
use docs_mapper::config::{load_config_with_hash, validate_seed_url, Config};
use docs_mapper::crawler::{CrawlEngine, LogSink};
use docs_mapper::output::{write_json_report, write_markdown_report, Report};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Docs-Mapper: a polite documentation site mapper
///
/// Docs-Mapper crawls a documentation site from a seed URL, following links on the
/// same host under a fixed concurrency cap and rate limit, and writes a JSON report
/// plus a markdown summary of what it found.
#[derive(Parser, Debug)]
#[command(name = "docs-mapper")]
#[command(version = "1.0.0")]
#[command(about = "A polite documentation site mapper", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from (overrides `seed-url` in the config)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Where to write the JSON report (overrides the config)
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Where to write the markdown summary (overrides the config)
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let seed = cli
        .url
        .clone()
        .or_else(|| config.crawler.seed_url.clone())
        .context("no seed URL: pass one on the command line or set crawler.seed-url")?;
    validate_seed_url(&seed)?;

    let json_path = cli
        .json
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));
    let summary_path = cli
        .summary
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.summary_path));

    if cli.dry_run {
        handle_dry_run(&config, &seed, &json_path, &summary_path);
        return Ok(());
    }

    handle_crawl(&config, &seed, &json_path, &summary_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docs_mapper=info,warn"),
            1 => EnvFilter::new("docs_mapper=debug,info"),
            2 => EnvFilter::new("docs_mapper=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, seed: &str, json_path: &Path, summary_path: &Path) {
    println!("=== Docs-Mapper Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max concurrent fetches: {}", config.crawler.max_concurrent);
    println!("  Rate limit: {}ms", config.crawler.rate_limit_ms);
    println!("  Max attempts per page: {}", config.crawler.max_retries);
    println!("  Timeout per attempt: {}ms", config.crawler.timeout_ms);
    println!("  Top pages in report: {}", config.crawler.top_pages);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    if config.fetcher.link_patterns.is_empty() {
        println!("  Link patterns: (follow every link)");
    } else {
        println!("  Link patterns: {}", config.fetcher.link_patterns.join(", "));
    }

    println!("\nOutput:");
    println!("  Report: {}", json_path.display());
    println!("  Summary: {}", summary_path.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    seed: &str,
    json_path: &Path,
    summary_path: &Path,
) -> anyhow::Result<()> {
    let engine = Arc::new(CrawlEngine::from_config(config));

    // Release the fetch resource on Ctrl-C; the crawl then finishes as cancelled
    let shutdown = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, shutting down");
                engine.shutdown();
            }
        })
    };

    let result = engine.crawl_report(seed, &LogSink).await;
    shutdown.abort();
    engine.shutdown();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    write_json_report(&report, json_path)?;
    write_markdown_report(&report, seed, summary_path)?;

    print_summary(&report, json_path, summary_path);
    Ok(())
}

fn print_summary(report: &Report, json_path: &Path, summary_path: &Path) {
    let summary = &report.summary;

    println!("\n=== Crawl Complete ===\n");
    println!(
        "  Pages: {} ({} ok, {} failed)",
        summary.total_pages, summary.successful_crawls, summary.failed_crawls
    );
    println!("  Links: {}", summary.total_links);
    match summary.average_content_length {
        Some(average) => println!("  Average content length: {:.0}", average),
        None => println!("  Average content length: n/a"),
    }
    println!("  Duration: {:.1}s", report.performance.duration_secs);

    if let Some(top) = report.top_pages.first() {
        println!("  Most referenced: {} ({} references)", top.url, top.references);
    }

    println!("\n✓ Report written to: {}", json_path.display());
    println!("✓ Summary written to: {}", summary_path.display());
}
