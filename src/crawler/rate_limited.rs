//! Rate-limited, retrying wrapper around a `PageFetcher`
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Failure, attempts left | Wait `base_delay × attempt`, try again |
//! | Failure, attempts exhausted | Surface the last error |
//! | Fetch resource closed or unavailable | Surface immediately |
//! | Attempt exceeds `timeout` | Counts as a `Timeout` failure |
//! | Success | Wait `base_delay`, then return |

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::{FetchCause, FetchError};
use std::sync::Arc;
use std::time::Duration;

/// Attempt budget and pacing for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Courtesy delay after every success, and unit of the linear backoff
    pub base_delay: Duration,
    /// Limit on a single attempt
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, after attempt `attempt` (1-based) failed
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            timeout: config.timeout(),
        }
    }
}

/// Wraps a `PageFetcher` with a fixed inter-call delay and bounded linear backoff
///
/// Attempts for one URL are sequential; calls for different URLs may run concurrently.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    inner: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
}

impl RateLimitedFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Fetches `url`, retrying failed attempts up to the policy's budget
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(url).await {
                Ok(page) => {
                    tokio::time::sleep(self.policy.base_delay).await;
                    return Ok(page);
                }
                Err(err) if attempt < max_attempts && err.cause.is_retryable() => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        url,
                        err.cause,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::debug!("Giving up on {} after {} attempt(s)", url, attempt);
                    return Err(err);
                }
            }
        }
    }

    /// Releases the wrapped fetcher's shared resource
    pub fn close(&self) {
        self.inner.close();
    }

    async fn attempt(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match tokio::time::timeout(self.policy.timeout, self.inner.fetch(url, self.policy.timeout))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(url, FetchCause::Timeout)),
        }
    }
}
