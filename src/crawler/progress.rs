//! Progress events emitted while a crawl is in flight
//!
//! Sinks are invoked synchronously from traversal branches, so they must return quickly.
//! A sink that errors or panics is logged and otherwise ignored: it can never stop a crawl.

use crate::output::Report;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc::UnboundedSender;

/// A crawl lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CrawlEvent {
    /// The crawl accepted its seed URL
    Started { url: String },

    /// A URL is about to be fetched
    #[serde(rename_all = "camelCase")]
    Progress {
        current_url: String,
        total_pages_so_far: usize,
    },

    /// One page failed; the crawl continues
    PageFailed { url: String, error: String },

    /// The crawl finished and produced a report
    Completed { report: Box<Report> },

    /// The crawl as a whole failed
    Failed { url: String, error: String },
}

/// Observer of crawl progress
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &CrawlEvent) -> anyhow::Result<()>;
}

impl<F> ProgressSink for F
where
    F: Fn(&CrawlEvent) + Send + Sync,
{
    fn notify(&self, event: &CrawlEvent) -> anyhow::Result<()> {
        (self)(event);
        Ok(())
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn notify(&self, _event: &CrawlEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn notify(&self, event: &CrawlEvent) -> anyhow::Result<()> {
        match event {
            CrawlEvent::Started { url } => tracing::info!("Starting crawl of {}", url),
            CrawlEvent::Progress {
                current_url,
                total_pages_so_far,
            } => tracing::info!(
                "Crawling {} ({} pages so far)",
                current_url,
                total_pages_so_far
            ),
            CrawlEvent::PageFailed { url, error } => {
                tracing::warn!("Page {} failed: {}", url, error)
            }
            CrawlEvent::Completed { report } => tracing::info!(
                "Crawl complete: {} pages, {} failed",
                report.summary.total_pages,
                report.summary.failed_crawls
            ),
            CrawlEvent::Failed { url, error } => {
                tracing::error!("Crawl of {} failed: {}", url, error)
            }
        }
        Ok(())
    }
}

/// Forwards events into an unbounded channel
///
/// A hosting service can drain the receiver and broadcast events to its clients.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<CrawlEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<CrawlEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, event: &CrawlEvent) -> anyhow::Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("progress receiver dropped"))
    }
}

/// Delivers `event` to `sink`, swallowing errors and panics
pub(crate) fn emit(sink: &dyn ProgressSink, event: CrawlEvent) {
    match catch_unwind(AssertUnwindSafe(|| sink.notify(&event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Progress sink error (ignored): {:#}", e),
        Err(_) => tracing::warn!("Progress sink panicked (ignored)"),
    }
}
