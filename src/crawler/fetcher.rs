//! Page fetching
//!
//! This module defines the `PageFetcher` capability the crawl engine drives, and the
//! HTTP implementation used by the binary:
//! - `FetchResourcePool` owns the single shared HTTP client, created on first use and
//!   torn down explicitly on shutdown
//! - `HttpPageFetcher` GETs a page, classifies failures and extracts followable links

use crate::config::FetcherConfig;
use crate::crawler::parser::extract_links;
use crate::state::LinkInfo;
use crate::{FetchCause, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

/// Raw markup of a fetched page and the links found on it
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub content: String,
    pub links: Vec<LinkInfo>,
}

/// Capability that renders or downloads one page
///
/// Implementations must be safe to call concurrently for different URLs.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`, giving up after `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;

    /// Releases any shared resource; later fetches must fail fast
    fn close(&self) {}
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use docs_mapper::config::FetcherConfig;
/// use docs_mapper::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Default)]
struct PoolSlot {
    client: Option<Client>,
    closed: bool,
}

/// Shared fetch resource with an explicit open/close lifecycle
///
/// The client is built lazily by the first fetch. After `close`, `client()` fails with
/// `FetchCause::Closed` instead of building a new one.
#[derive(Debug)]
pub struct FetchResourcePool {
    config: FetcherConfig,
    slot: Mutex<PoolSlot>,
}

impl FetchResourcePool {
    /// Opens a pool; no client exists until the first fetch
    pub fn open(config: FetcherConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(PoolSlot::default()),
        }
    }

    /// Returns the shared client, building it on first use
    pub fn client(&self) -> Result<Client, FetchCause> {
        let mut slot = self.lock();
        if slot.closed {
            return Err(FetchCause::Closed);
        }

        if let Some(client) = &slot.client {
            return Ok(client.clone());
        }

        tracing::debug!("Starting HTTP client (user agent: {})", self.config.user_agent);
        let client = build_http_client(&self.config)
            .map_err(|e| FetchCause::Unavailable(format!("failed to start HTTP client: {}", e)))?;
        slot.client = Some(client.clone());
        Ok(client)
    }

    /// Tears down the shared client
    pub fn close(&self) {
        let mut slot = self.lock();
        if !slot.closed {
            tracing::info!("Closing fetch resource");
        }
        slot.client = None;
        slot.closed = true;
    }

    pub fn is_open(&self) -> bool {
        !self.lock().closed
    }

    /// Whether the client has been built yet
    pub fn is_started(&self) -> bool {
        self.lock().client.is_some()
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PoolSlot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `PageFetcher` over plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    pool: Arc<FetchResourcePool>,
}

impl HttpPageFetcher {
    pub fn new(pool: Arc<FetchResourcePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    /// Fetches a URL and extracts its links
    ///
    /// # Error Classification
    ///
    /// | Condition | Cause |
    /// |-----------|-------|
    /// | Pool closed | `Closed` |
    /// | Timeout | `Timeout` |
    /// | Connection / body error | `Network` |
    /// | Non-2xx status | `Status(code)` |
    /// | Content-Type not HTML | `NotHtml` |
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let fail = |cause| FetchError::new(url, cause);

        let client = self.pool.client().map_err(fail)?;

        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fail(classify_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchCause::Status(status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(fail(FetchCause::NotHtml(content_type)));
        }

        let final_url: Url = response.url().clone();
        let content = response
            .text()
            .await
            .map_err(|e| fail(classify_reqwest_error(&e)))?;

        let links = extract_links(&content, &final_url, &self.pool.config().link_patterns);
        tracing::debug!("Fetched {} ({} links)", url, links.len());

        Ok(FetchedPage { content, links })
    }

    fn close(&self) {
        self.pool.close();
    }
}

fn classify_reqwest_error(error: &reqwest::Error) -> FetchCause {
    if error.is_timeout() {
        FetchCause::Timeout
    } else {
        FetchCause::Network(error.to_string())
    }
}
