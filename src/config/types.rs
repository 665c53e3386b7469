use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Docs-Mapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Seed URL to start from (the CLI argument takes precedence)
    #[serde(default)]
    pub seed_url: Option<String>,

    /// Maximum number of page fetches in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Base delay between fetches and unit of the linear retry backoff (milliseconds)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Total fetch attempts per URL
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Timeout for a single fetch attempt (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of most-referenced pages listed in the report
    #[serde(default = "default_top_pages")]
    pub top_pages: usize,
}

impl CrawlerConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: None,
            max_concurrent: default_max_concurrent(),
            rate_limit_ms: default_rate_limit_ms(),
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            top_pages: default_top_pages(),
        }
    }
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Substrings a link URL must contain to be followed (empty = follow all)
    #[serde(default = "default_link_patterns")]
    pub link_patterns: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            link_patterns: default_link_patterns(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the JSON report
    #[serde(default = "default_report_path")]
    pub report_path: String,

    /// Path of the markdown summary
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
            summary_path: default_summary_path(),
        }
    }
}

fn default_max_concurrent() -> u32 {
    3
}

fn default_rate_limit_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_top_pages() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("docs-mapper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_link_patterns() -> Vec<String> {
    vec![
        "/documentation/".to_string(),
        "/library/".to_string(),
        "/api/".to_string(),
    ]
}

fn default_report_path() -> String {
    "crawl-report.json".to_string()
}

fn default_summary_path() -> String {
    "crawl-summary.md".to_string()
}
