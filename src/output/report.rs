//! Aggregation of a finished crawl into a report
//!
//! `ReportBuilder::build` is a pure function of a terminal `CrawlState`: it reads the
//! page map, error list and timestamps, and never consults the clock, so building twice
//! from the same state yields identical reports.

use crate::state::{CrawlState, PageError, PageRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate counts over the whole crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Successful plus failed pages
    pub total_pages: usize,
    pub successful_crawls: usize,
    pub failed_crawls: usize,
    /// Sum of child URL counts over successful pages
    pub total_links: usize,
    /// Sum of body text lengths over successful pages
    pub total_content: usize,
    /// `total_content / successful_crawls`, rounded; `None` when nothing succeeded
    pub average_content_length: Option<f64>,
}

/// One entry of the most-referenced pages table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPage {
    pub url: String,
    pub references: u32,
    /// Number of headings on the page
    pub content_items: usize,
}

/// Timing of the crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    /// Successful pages per second, or 0 for an instantaneous crawl
    pub pages_per_second: f64,
}

/// Read-only snapshot of a finished crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: ReportSummary,
    pub top_pages: Vec<TopPage>,
    pub errors: Vec<PageError>,
    pub performance: Performance,
}

/// Builds reports from terminal crawl states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBuilder {
    top_n: usize,
}

impl ReportBuilder {
    /// Default number of entries in `Report::top_pages`
    pub const DEFAULT_TOP_PAGES: usize = 10;

    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Aggregates `state` into a report
    pub fn build(&self, state: &CrawlState) -> Report {
        let successful_crawls = state.pages.len();
        let failed_crawls = state.errors.len();

        let total_links: usize = state.pages.iter().map(|p| p.child_urls.len()).sum();
        let total_content: usize = state.pages.iter().map(|p| p.content.content_length).sum();

        let average_content_length = if successful_crawls == 0 {
            None
        } else {
            Some((total_content as f64 / successful_crawls as f64).round())
        };

        Report {
            summary: ReportSummary {
                total_pages: successful_crawls + failed_crawls,
                successful_crawls,
                failed_crawls,
                total_links,
                total_content,
                average_content_length,
            },
            top_pages: self.top_pages(state),
            errors: state.errors.clone(),
            performance: performance(state),
        }
    }

    /// Pages by reference count, descending; ties keep insertion order
    fn top_pages(&self, state: &CrawlState) -> Vec<TopPage> {
        let mut pages: Vec<&PageRecord> = state.pages.iter().collect();
        // `sort_by` is stable, which preserves insertion order among ties
        pages.sort_by(|a, b| b.reference_count.cmp(&a.reference_count));

        pages
            .into_iter()
            .take(self.top_n)
            .map(|page| TopPage {
                url: page.url.clone(),
                references: page.reference_count,
                content_items: page.content.headings.len(),
            })
            .collect()
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOP_PAGES)
    }
}

fn performance(state: &CrawlState) -> Performance {
    let elapsed = state.finished_at - state.started_at;
    let duration_secs = (elapsed.num_milliseconds().max(0) as f64) / 1000.0;

    let pages_per_second = if duration_secs > 0.0 {
        state.pages.len() as f64 / duration_secs
    } else {
        0.0
    };

    Performance {
        started_at: state.started_at,
        finished_at: state.finished_at,
        duration_secs,
        pages_per_second,
    }
}
