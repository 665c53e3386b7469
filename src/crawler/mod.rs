//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - The counting gate that caps simultaneous fetches
//! - HTTP fetching behind the `PageFetcher` capability
//! - Rate limiting and retry with linear backoff
//! - HTML parsing and link extraction
//! - Progress events for observers
//! - Overall crawl orchestration in `CrawlEngine`

mod engine;
mod fetcher;
mod gate;
mod parser;
mod progress;
mod rate_limited;

pub use engine::CrawlEngine;
pub use fetcher::{build_http_client, FetchResourcePool, FetchedPage, HttpPageFetcher, PageFetcher};
pub use gate::{ConcurrencyGate, GateClosed, GatePermit};
pub use parser::{build_page_content, extract_links};
pub use progress::{ChannelSink, CrawlEvent, LogSink, NoopSink, ProgressSink};
pub use rate_limited::{RateLimitedFetcher, RetryPolicy};
