//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl report,
//! including overall statistics, the most-referenced pages and per-page errors.

use crate::output::{OutputResult, Report};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of `report`
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `seed` - The seed URL the crawl started from
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_report(report: &Report, seed: &str, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report, seed);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::debug!("Wrote markdown summary to {}", output_path.display());
    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &Report, seed: &str) -> String {
    let mut md = String::new();
    let summary = &report.summary;
    let performance = &report.performance;

    md.push_str("# Docs-Mapper Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", seed));
    md.push_str(&format!("- **Started**: {}\n", performance.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", performance.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} pages/second)\n\n",
        performance.duration_secs, performance.pages_per_second
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Total Pages | {} |\n", summary.total_pages));
    md.push_str(&format!("| Successful | {} |\n", summary.successful_crawls));
    md.push_str(&format!("| Failed | {} |\n", summary.failed_crawls));
    md.push_str(&format!("| Total Links | {} |\n", summary.total_links));
    md.push_str(&format!("| Total Content | {} |\n", summary.total_content));
    match summary.average_content_length {
        Some(average) => md.push_str(&format!("| Average Content Length | {:.0} |\n\n", average)),
        None => md.push_str("| Average Content Length | n/a |\n\n"),
    }

    if !report.top_pages.is_empty() {
        md.push_str(&format!("## Top {} Pages\n\n", report.top_pages.len()));
        md.push_str("| URL | References | Headings |\n");
        md.push_str("|-----|------------|----------|\n");

        for page in &report.top_pages {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                page.url, page.references, page.content_items
            ));
        }
        md.push('\n');
    }

    if !report.errors.is_empty() {
        md.push_str("## Errors\n\n");
        for error in &report.errors {
            md.push_str(&format!("- {}: {}\n", error.url, error.error));
        }
        md.push('\n');
    }

    md
}
