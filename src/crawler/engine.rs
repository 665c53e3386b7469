//! Crawl engine - recursive, origin-scoped traversal
//!
//! This module contains the traversal that drives a crawl from a seed URL:
//! - Claiming each URL exactly once through a per-run `VisitedSet`
//! - Admitting fetches through the shared `ConcurrencyGate`
//! - Fetching through the `RateLimitedFetcher`
//! - Fanning out concurrently over same-origin children and joining them
//! - Recording pages, in-edge tallies and per-page errors in a per-run ledger
//!
//! Every call to `crawl` gets fresh bookkeeping; only the gate, the fetcher and the
//! robots policy are shared between calls.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{FetchResourcePool, HttpPageFetcher, PageFetcher};
use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::parser::build_page_content;
use crate::crawler::progress::{emit, CrawlEvent, ProgressSink};
use crate::crawler::rate_limited::{RateLimitedFetcher, RetryPolicy};
use crate::output::{Report, ReportBuilder};
use crate::robots::{AllowAll, RobotsPolicy};
use crate::state::{CrawlLedger, CrawlState, PageError, PageMap, PageRecord, VisitedSet};
use crate::url::{canonicalize_url, extract_host, is_same_origin};
use crate::{FetchCause, FetchError, MapperError, UrlError};
use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Main crawl engine structure
pub struct CrawlEngine {
    fetcher: RateLimitedFetcher,
    gate: ConcurrencyGate,
    robots: Arc<dyn RobotsPolicy>,
    reports: ReportBuilder,
}

impl CrawlEngine {
    /// Creates an engine around an injected page fetcher
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetch capability, shared by every crawl this engine runs
    /// * `config` - Concurrency cap, retry budget, pacing and report size
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher: RateLimitedFetcher::new(fetcher, RetryPolicy::from(config)),
            gate: ConcurrencyGate::new(config.max_concurrent as usize),
            robots: Arc::new(AllowAll),
            reports: ReportBuilder::new(config.top_pages),
        }
    }

    /// Creates an engine that fetches over HTTP through a lazily started client pool
    pub fn from_config(config: &Config) -> Self {
        let pool = Arc::new(FetchResourcePool::open(config.fetcher.clone()));
        Self::new(Arc::new(HttpPageFetcher::new(pool)), &config.crawler)
    }

    /// Replaces the robots policy consulted before each fetch
    pub fn with_robots(mut self, robots: Arc<dyn RobotsPolicy>) -> Self {
        self.robots = robots;
        self
    }

    /// Tears down the engine for process shutdown
    ///
    /// Closes the gate so queued and future fetches fail fast, and releases the shared
    /// fetch resource. A crawl in progress finishes with `MapperError::Cancelled`.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down crawl engine");
        self.gate.close();
        self.fetcher.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.gate.is_closed()
    }

    /// Crawls every page reachable from `seed` on the seed's host
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlState)` - The traversal finished; per-page failures are in `errors`
    /// * `Err(MapperError)` - The seed is invalid or could not be fetched, the fetch
    ///   resource could not start, or the engine was shut down
    pub async fn crawl(
        &self,
        seed: &str,
        sink: &dyn ProgressSink,
    ) -> Result<CrawlState, MapperError> {
        let seed_url = canonicalize_url(seed)?;
        let origin = extract_host(&seed_url).ok_or(UrlError::MissingHost)?;
        let seed = seed_url.to_string();

        if self.is_shut_down() {
            return Err(MapperError::Cancelled);
        }

        let started_at = Utc::now();
        tracing::info!("Starting crawl of {} (origin {})", seed, origin);
        emit(sink, CrawlEvent::Started { url: seed.clone() });

        let run = CrawlRun::new(self, origin.clone(), sink);
        run.ledger().record_discovery(&seed);

        match run.process(&seed).await {
            Ok(children) => run.fan_out(children).await,
            Err(err) => return Err(self.seed_failure(err)),
        }

        if self.is_shut_down() {
            tracing::warn!("Crawl of {} interrupted by shutdown", seed);
            return Err(MapperError::Cancelled);
        }

        let (pages, errors, visited) = run.into_parts();
        let finished_at = Utc::now();
        tracing::info!(
            "Crawl of {} finished: {} pages, {} errors",
            seed,
            pages.len(),
            errors.len()
        );

        Ok(CrawlState {
            seed,
            origin,
            pages,
            visited,
            errors,
            started_at,
            finished_at,
        })
    }

    /// Runs a crawl and aggregates it into a report
    ///
    /// Emits `Completed` with the report, or `Failed` with the error, to `sink`.
    pub async fn crawl_report(
        &self,
        seed: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Report, MapperError> {
        match self.crawl(seed, sink).await {
            Ok(state) => {
                let report = self.report(&state);
                emit(
                    sink,
                    CrawlEvent::Completed {
                        report: Box::new(report.clone()),
                    },
                );
                Ok(report)
            }
            Err(err) => {
                emit(
                    sink,
                    CrawlEvent::Failed {
                        url: seed.to_string(),
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    /// Aggregates a finished crawl with this engine's report settings
    pub fn report(&self, state: &CrawlState) -> Report {
        self.reports.build(state)
    }

    fn seed_failure(&self, err: FetchError) -> MapperError {
        if self.is_shut_down() {
            return MapperError::Cancelled;
        }

        if let FetchCause::Unavailable(message) = &err.cause {
            return MapperError::ResourceInit(message.clone());
        }

        MapperError::SeedFailed {
            url: err.url.clone(),
            source: err,
        }
    }
}

/// Bookkeeping for one `crawl` invocation
struct CrawlRun<'a> {
    engine: &'a CrawlEngine,
    origin: String,
    ledger: Mutex<CrawlLedger>,
    visited: VisitedSet,
    sink: &'a dyn ProgressSink,
}

impl<'a> CrawlRun<'a> {
    fn new(engine: &'a CrawlEngine, origin: String, sink: &'a dyn ProgressSink) -> Self {
        Self {
            engine,
            origin,
            ledger: Mutex::new(CrawlLedger::new()),
            visited: VisitedSet::new(),
            sink,
        }
    }

    /// Crawls `url` and, on success, everything newly reachable from it
    fn visit(&self, url: String) -> BoxFuture<'_, ()> {
        async move {
            match self.process(&url).await {
                Ok(children) => self.fan_out(children).await,
                Err(err) => self.record_failure(&err.url, err.cause.to_string()),
            }
        }
        .boxed()
    }

    /// Counts one in-edge per child, then visits the unclaimed ones concurrently
    ///
    /// Returns only after every branch spawned here has finished.
    async fn fan_out(&self, children: Vec<String>) {
        let mut branches = Vec::new();

        for child in children {
            self.ledger().record_discovery(&child);

            if self.visited.contains(&child) {
                tracing::debug!("Already claimed: {}", child);
                continue;
            }
            branches.push(self.visit(child));
        }

        join_all(branches).await;
    }

    /// Claims, fetches and records a single page
    ///
    /// Returns the page's distinct same-origin children, or nothing when the URL is off
    /// origin, already recorded, claimed by another branch, or disallowed.
    async fn process(&self, url: &str) -> Result<Vec<String>, FetchError> {
        if !is_same_origin(&self.origin, url) {
            tracing::debug!("Skipping off-origin URL: {}", url);
            return Ok(Vec::new());
        }

        let total_pages_so_far = {
            let ledger = self.ledger();
            if ledger.contains_page(url) {
                return Ok(Vec::new());
            }
            ledger.page_count()
        };

        emit(
            self.sink,
            CrawlEvent::Progress {
                current_url: url.to_string(),
                total_pages_so_far,
            },
        );

        if !self.visited.try_claim(url) {
            tracing::debug!("Claim denied: {}", url);
            return Ok(Vec::new());
        }

        if !self.engine.robots.is_allowed(url) {
            tracing::info!("Disallowed by robots policy: {}", url);
            self.record_failure(url, "disallowed by robots policy".to_string());
            return Ok(Vec::new());
        }

        // The slot is held through retries and the courtesy delay
        let permit = self
            .engine
            .gate
            .acquire()
            .await
            .map_err(|_| FetchError::new(url, FetchCause::Closed))?;
        tracing::info!("Fetching {}", url);
        let fetched = self.engine.fetcher.fetch(url).await;
        permit.release();
        let fetched = fetched?;

        let content = build_page_content(&fetched.content, fetched.links);
        let child_urls: Vec<String> = content
            .links
            .iter()
            .filter_map(|link| canonicalize_url(&link.href).ok())
            .map(|child| child.to_string())
            .collect();

        let children = same_origin_children(&self.origin, &child_urls);

        let inserted = self.ledger().insert_page(PageRecord {
            url: url.to_string(),
            reference_count: 1,
            content,
            child_urls,
        });
        if !inserted {
            tracing::warn!("Page {} was recorded twice; keeping the first record", url);
        }

        Ok(children)
    }

    /// Records a page error and reports it to the sink
    fn record_failure(&self, url: &str, error: String) {
        tracing::warn!("Failed to crawl {}: {}", url, error);

        self.ledger().record_error(url, error.clone());
        emit(
            self.sink,
            CrawlEvent::PageFailed {
                url: url.to_string(),
                error,
            },
        );
    }

    fn ledger(&self) -> MutexGuard<'_, CrawlLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn into_parts(self) -> (PageMap, Vec<PageError>, HashSet<String>) {
        let ledger = self
            .ledger
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (pages, errors) = ledger.into_parts();
        (pages, errors, self.visited.into_inner())
    }
}

/// Distinct same-origin URLs in first-seen order
fn same_origin_children(origin: &str, urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| is_same_origin(origin, url))
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}
