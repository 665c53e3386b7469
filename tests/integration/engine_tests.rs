//! Traversal properties over synthetic link graphs
//!
//! These tests drive `CrawlEngine` with an in-memory `PageFetcher` that records every
//! call, so graph shape, concurrency and retry behavior can be checked without HTTP.

use async_trait::async_trait;
use docs_mapper::config::CrawlerConfig;
use docs_mapper::crawler::{ChannelSink, CrawlEngine, CrawlEvent, FetchedPage, NoopSink, PageFetcher};
use docs_mapper::robots::RobotsPolicy;
use docs_mapper::state::LinkInfo;
use docs_mapper::{FetchCause, FetchError, MapperError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory site with fetch instrumentation
#[derive(Default)]
struct FakeSite {
    graph: HashMap<String, Vec<String>>,
    /// Number of leading failures per URL
    failures: HashMap<String, usize>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSite {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(from, to)| (url(from), to.iter().map(|t| url(t)).collect()))
            .collect();
        Self {
            graph,
            ..Self::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self, page: &str, times: usize) -> Self {
        self.failures.insert(url(page), times);
        self
    }

    fn calls(&self, page: &str) -> usize {
        self.calls.lock().unwrap().get(&url(page)).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, target: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(target.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if call <= self.failures.get(target).copied().unwrap_or(0) {
            return Err(FetchError::new(
                target,
                FetchCause::Network("connection reset".to_string()),
            ));
        }

        let children = self
            .graph
            .get(target)
            .ok_or_else(|| FetchError::new(target, FetchCause::Status(404)))?;

        Ok(FetchedPage {
            content: format!("<html><body><p>{}</p></body></html>", target),
            links: children.iter().map(|href| link(href)).collect(),
        })
    }
}

/// Expands a short page name to a full URL; full URLs pass through
fn url(page: &str) -> String {
    if page.starts_with("http") {
        page.to_string()
    } else {
        format!("https://docs.example.com/{}", page)
    }
}

fn link(href: &str) -> LinkInfo {
    LinkInfo {
        href: href.to_string(),
        text: href.to_string(),
        link_type: "page".to_string(),
        title: href.to_string(),
        parent: String::new(),
        is_framework: false,
        is_api: false,
    }
}

fn config(max_concurrent: u32, max_retries: u32) -> CrawlerConfig {
    CrawlerConfig {
        max_concurrent,
        max_retries,
        rate_limit_ms: 1,
        ..CrawlerConfig::default()
    }
}

fn engine(site: &Arc<FakeSite>, cfg: &CrawlerConfig) -> CrawlEngine {
    CrawlEngine::new(Arc::clone(site) as Arc<dyn PageFetcher>, cfg)
}

#[tokio::test]
async fn test_cyclic_graph_terminates_and_fetches_once() {
    let site = Arc::new(FakeSite::new(&[
        ("root", &["a", "b"]),
        ("a", &["b", "c", "root"]),
        ("b", &["c", "a"]),
        ("c", &["root", "a", "c"]),
    ]));

    let state = engine(&site, &config(3, 1))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    assert_eq!(state.pages.len(), 4);
    for page in ["root", "a", "b", "c"] {
        assert_eq!(site.calls(page), 1, "{page} fetched more than once");
        assert!(state.visited.contains(&url(page)));
    }

    // Every recorded page was claimed
    assert!(state.pages.urls().all(|u| state.visited.contains(u)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_fetches_never_exceed_cap() {
    let mut edges: Vec<(String, Vec<String>)> = Vec::new();
    let hubs: Vec<String> = (0..8).map(|i| format!("hub{}", i)).collect();
    edges.push(("root".to_string(), hubs.clone()));
    for hub in &hubs {
        let leaves = (0..4).map(|j| format!("{}-leaf{}", hub, j)).collect::<Vec<_>>();
        for leaf in &leaves {
            edges.push((leaf.clone(), vec![]));
        }
        edges.push((hub.clone(), leaves));
    }
    let edge_refs: Vec<(&str, Vec<&str>)> = edges
        .iter()
        .map(|(from, to)| (from.as_str(), to.iter().map(String::as_str).collect()))
        .collect();
    let edge_slices: Vec<(&str, &[&str])> = edge_refs
        .iter()
        .map(|(from, to)| (*from, to.as_slice()))
        .collect();

    let site = Arc::new(FakeSite::new(&edge_slices).with_delay(Duration::from_millis(5)));

    let state = engine(&site, &config(3, 1))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    assert_eq!(state.pages.len(), 1 + 8 + 32);
    assert!(site.peak.load(Ordering::SeqCst) <= 3);
    assert!(site.peak.load(Ordering::SeqCst) >= 2);
    assert_eq!(site.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reference_count_counts_distinct_in_edges() {
    let site = Arc::new(
        FakeSite::new(&[
            ("root", &["a", "c"]),
            ("a", &["b"]),
            ("c", &["b", "b"]),
            ("b", &["root"]),
        ])
        .with_delay(Duration::from_millis(2)),
    );

    let state = engine(&site, &config(3, 1))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    let refs = |page: &str| state.pages.get(&url(page)).unwrap().reference_count;
    assert_eq!(refs("b"), 2);
    assert_eq!(refs("a"), 1);
    assert_eq!(refs("c"), 1);
    // Seed entry plus the back-link from b
    assert_eq!(refs("root"), 2);
    assert_eq!(site.calls("b"), 1);
}

#[tokio::test]
async fn test_retries_within_budget_succeed() {
    // Fails twice, succeeds on the third of three attempts
    let site = Arc::new(FakeSite::new(&[("root", &["flaky"]), ("flaky", &[])]).failing("flaky", 2));

    let state = engine(&site, &config(3, 3))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    assert!(state.pages.contains(&url("flaky")));
    assert!(state.errors.is_empty());
    assert_eq!(site.calls("flaky"), 3);
}

#[tokio::test]
async fn test_retries_beyond_budget_surface_error() {
    // Would succeed on the fourth attempt, but only three are allowed
    let site = Arc::new(FakeSite::new(&[("root", &["flaky"]), ("flaky", &[])]).failing("flaky", 3));

    let state = engine(&site, &config(3, 3))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    assert!(!state.pages.contains(&url("flaky")));
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].url, url("flaky"));
    assert_eq!(state.errors[0].error, "network error: connection reset");
    assert_eq!(site.calls("flaky"), 3);
}

#[tokio::test]
async fn test_cross_origin_pages_are_never_fetched() {
    let site = Arc::new(FakeSite::new(&[
        (
            "root",
            &["a", "https://other.example.org/x", "https://example.com/y"],
        ),
        ("a", &["https://other.example.org/z"]),
        ("https://other.example.org/x", &[]),
        ("https://example.com/y", &[]),
    ]));

    let state = engine(&site, &config(3, 1))
        .crawl(&url("root"), &NoopSink)
        .await
        .unwrap();

    assert_eq!(state.origin, "docs.example.com");
    assert_eq!(state.pages.len(), 2);
    assert!(state
        .pages
        .iter()
        .all(|p| p.url.starts_with("https://docs.example.com/")));
    assert_eq!(site.calls("https://other.example.org/x"), 0);
    assert_eq!(site.calls("https://example.com/y"), 0);
}

#[tokio::test]
async fn test_report_is_idempotent() {
    let site = Arc::new(FakeSite::new(&[
        ("root", &["a", "b", "missing"]),
        ("a", &["b"]),
        ("b", &[]),
    ]));
    let engine = engine(&site, &config(3, 1));

    let state = engine.crawl(&url("root"), &NoopSink).await.unwrap();

    let first = engine.report(&state);
    let second = engine.report(&state);
    assert_eq!(first, second);
    assert_eq!(first.summary.total_pages, 4);
    assert_eq!(first.summary.failed_crawls, 1);
    assert_eq!(first.top_pages[0].url, url("b"));
}

struct DenyAll;

impl RobotsPolicy for DenyAll {
    fn is_allowed(&self, _url: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn test_crawl_without_successes_has_undefined_average() {
    let site = Arc::new(FakeSite::new(&[("root", &[])]));
    let engine = engine(&site, &config(3, 1)).with_robots(Arc::new(DenyAll));

    let report = engine.crawl_report(&url("root"), &NoopSink).await.unwrap();

    assert_eq!(report.summary.successful_crawls, 0);
    assert_eq!(report.summary.failed_crawls, 1);
    assert_eq!(report.summary.average_content_length, None);
    assert_eq!(site.total_calls(), 0);
}

#[tokio::test]
async fn test_only_fetch_failing_aborts_crawl() {
    let site = Arc::new(FakeSite::new(&[]));

    let err = engine(&site, &config(3, 1))
        .crawl_report(&url("root"), &NoopSink)
        .await
        .unwrap_err();

    assert!(matches!(err, MapperError::SeedFailed { .. }));
}

#[tokio::test]
async fn test_shutdown_cancels_crawl_in_flight() {
    let mut edges: Vec<(String, Vec<String>)> = Vec::new();
    let children: Vec<String> = (0..20).map(|i| format!("page{}", i)).collect();
    edges.push(("root".to_string(), children.clone()));
    for child in &children {
        edges.push((child.clone(), vec![]));
    }
    let edge_refs: Vec<(&str, Vec<&str>)> = edges
        .iter()
        .map(|(from, to)| (from.as_str(), to.iter().map(String::as_str).collect()))
        .collect();
    let edge_slices: Vec<(&str, &[&str])> = edge_refs
        .iter()
        .map(|(from, to)| (*from, to.as_slice()))
        .collect();

    let site = Arc::new(FakeSite::new(&edge_slices).with_delay(Duration::from_millis(20)));
    let engine = engine(&site, &config(1, 1));

    let root = url("root");
    let (result, ()) = tokio::join!(engine.crawl(&root, &NoopSink), async {
        tokio::time::sleep(Duration::from_millis(70)).await;
        engine.shutdown();
    });

    assert!(matches!(result, Err(MapperError::Cancelled)));
    // Queued fetches failed fast instead of running
    assert!(site.total_calls() < 21);
    assert!(engine.is_shut_down());
}

#[tokio::test]
async fn test_panicking_sink_does_not_abort_crawl() {
    let site = Arc::new(FakeSite::new(&[("root", &["a"]), ("a", &[])]));
    let sink = |_: &CrawlEvent| panic!("listener bug");

    let state = engine(&site, &config(3, 1))
        .crawl(&url("root"), &sink)
        .await
        .unwrap();

    assert_eq!(state.pages.len(), 2);
}

#[tokio::test]
async fn test_channel_sink_streams_events() {
    let site = Arc::new(FakeSite::new(&[("root", &["a", "gone"]), ("a", &[])]));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    engine(&site, &config(3, 1))
        .crawl_report(&url("root"), &ChannelSink::new(tx))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events.first(),
        Some(&CrawlEvent::Started { url: url("root") })
    );
    assert!(events.contains(&CrawlEvent::PageFailed {
        url: url("gone"),
        error: "HTTP 404".to_string(),
    }));
    match events.last() {
        Some(CrawlEvent::Completed { report }) => assert_eq!(report.summary.successful_crawls, 2),
        other => panic!("expected Completed, got {other:?}"),
    }
}
