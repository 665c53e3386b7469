//! Output module for crawl reports
//!
//! This module handles:
//! - Aggregating a finished crawl into a `Report`
//! - Writing the report as pretty-printed JSON
//! - Writing a human-readable markdown summary

mod json;
mod markdown;
mod report;

pub use json::{format_json_report, write_json_report};
pub use markdown::{format_markdown_report, write_markdown_report};
pub use report::{Performance, Report, ReportBuilder, ReportSummary, TopPage};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
