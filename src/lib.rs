//! Docs-Mapper: a polite documentation site mapper
//!
//! This crate crawls a documentation website from a seed URL, follows same-origin links
//! under a global concurrency cap, extracts page metadata, and aggregates the results
//! into a report.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Docs-Mapper operations
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Seed page {url} could not be crawled: {source}")]
    SeedFailed { url: String, source: FetchError },

    #[error("Crawl cancelled by shutdown")]
    Cancelled,

    #[error("Fetch resource failed to start: {0}")]
    ResourceInit(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Why a single page fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("expected HTML, got {0}")]
    NotHtml(String),

    #[error("fetch resource is closed")]
    Closed,

    #[error("render error: {0}")]
    Render(String),

    #[error("fetch resource unavailable: {0}")]
    Unavailable(String),
}

impl FetchCause {
    /// Returns true if another attempt may succeed
    ///
    /// Every page-level failure is retried; only a closed or unavailable fetch
    /// resource fails fast.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Closed | Self::Unavailable(_))
    }
}

/// A failed fetch of one URL, after retries were exhausted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }
}

/// Result type alias for Docs-Mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlEvent, ProgressSink};
pub use output::{Report, ReportBuilder};
pub use state::{CrawlState, PageRecord};
pub use url::{canonicalize_url, extract_host};
