//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use docs_mapper::config::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use docs_mapper::crawler::{CrawlEngine, CrawlEvent, NoopSink};
use docs_mapper::output::{write_json_report, write_markdown_report};
use docs_mapper::{FetchCause, MapperError};
use std::sync::Mutex;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration that follows every link
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: None,
            max_concurrent: 3,
            rate_limit_ms: 10, // Very short for testing
            max_retries: 2,
            timeout_ms: 5_000,
            top_pages: 10,
        },
        fetcher: FetcherConfig {
            user_agent: "docs-mapper-test/1.0".to_string(),
            link_patterns: vec![],
        },
        output: OutputConfig::default(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_origin() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let port = url::Url::parse(&base_url)
        .expect("Failed to parse base URL")
        .port()
        .expect("Mock server has a port");

    // X links to Y, Z and W on another hostname; Y links back to X
    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<h1>Home</h1>
            <a href="/y">Page Y</a>
            <a href="/z">Page Z</a>
            <a href="http://localhost:{}/w">Page W</a>"#,
            port
        ),
    )
    .await;
    mount_page(&mock_server, "/y", r#"<a href="/">Back home</a>"#).await;
    mount_page(&mock_server, "/z", "<p>Leaf page</p>").await;

    // W resolves to the same server; it must never be requested
    Mock::given(method("GET"))
        .and(path("/w"))
        .respond_with(html("<p>Other origin</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let state = engine
        .crawl(&format!("{}/", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    let x = format!("{}/", base_url);
    let y = format!("{}/y", base_url);
    let z = format!("{}/z", base_url);

    let mut urls: Vec<&str> = state.pages.urls().collect();
    urls.sort_unstable();
    let mut expected = vec![x.as_str(), y.as_str(), z.as_str()];
    expected.sort_unstable();
    assert_eq!(urls, expected);

    assert_eq!(state.pages.get(&x).unwrap().reference_count, 2);
    assert_eq!(state.pages.get(&y).unwrap().reference_count, 1);
    assert_eq!(state.pages.get(&z).unwrap().reference_count, 1);

    // The cross-origin link is kept as link data
    let home = state.pages.get(&x).unwrap();
    assert_eq!(home.content.links.len(), 3);
    assert_eq!(home.content.headings[0].text, "Home");
    assert!(home
        .child_urls
        .contains(&format!("http://localhost:{}/w", port)));

    assert!(state.errors.is_empty());
    assert!(state.pages.urls().all(|u| u.starts_with(&base_url)));
}

#[tokio::test]
async fn test_seed_failure_aborts_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let err = engine
        .crawl(&format!("{}/", mock_server.uri()), &NoopSink)
        .await
        .unwrap_err();

    match err {
        MapperError::SeedFailed { source, .. } => assert_eq!(source.cause, FetchCause::Status(404)),
        other => panic!("Expected SeedFailed, got {other}"),
    }
}

#[tokio::test]
async fn test_failed_page_is_retried_and_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">Broken</a> <a href="/ok">Fine</a>"#,
    )
    .await;
    mount_page(&mock_server, "/ok", "<p>Fine</p>").await;

    // Server errors are retried up to max-retries attempts
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let state = engine
        .crawl(&format!("{}/", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    assert_eq!(state.pages.len(), 2);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].url, format!("{}/broken", base_url));
    assert_eq!(state.errors[0].error, "HTTP 500");

    let report = engine.report(&state);
    assert_eq!(report.summary.total_pages, 3);
    assert_eq!(report.summary.successful_crawls, 2);
    assert_eq!(report.summary.failed_crawls, 1);
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/flaky">Flaky</a>"#).await;

    // First request fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", "<p>Recovered</p>").await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let state = engine
        .crawl(&format!("{}/", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    assert!(state.pages.contains(&format!("{}/flaky", base_url)));
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn test_client_error_recovers_within_budget() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/late">Late</a>"#).await;

    // A 404 on the first attempt is retried like any other failure
    Mock::given(method("GET"))
        .and(path("/late"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/late", "<p>Published</p>").await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let state = engine
        .crawl(&format!("{}/", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    assert!(state.pages.contains(&format!("{}/late", base_url)));
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn test_non_html_page_exhausts_retries() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/logo.png">Logo</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "image/png"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::from_config(&create_test_config());
    let state = engine
        .crawl(&format!("{}/", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    assert_eq!(state.pages.len(), 1);
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].error.contains("image/png"));
}

#[tokio::test]
async fn test_link_patterns_limit_traversal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/documentation",
        r#"<a href="/documentation/guide">Guide</a> <a href="/blog/news">News</a>"#,
    )
    .await;
    mount_page(&mock_server, "/documentation/guide", "<p>Guide</p>").await;
    Mock::given(method("GET"))
        .and(path("/blog/news"))
        .respond_with(html("<p>News</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetcher.link_patterns = vec!["/documentation/".to_string()];

    let engine = CrawlEngine::from_config(&config);
    let state = engine
        .crawl(&format!("{}/documentation", base_url), &NoopSink)
        .await
        .expect("Crawl failed");

    assert_eq!(state.pages.len(), 2);
    let seed = state.pages.get(&format!("{}/documentation", base_url)).unwrap();
    assert_eq!(seed.content.links.len(), 1);
    assert_eq!(seed.content.links[0].link_type, "documentation");
    assert!(seed.content.links[0].is_framework);
}

#[tokio::test]
async fn test_crawl_report_writes_outputs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<h2>Topics</h2><a href="/a">A</a>"#).await;
    mount_page(&mock_server, "/a", r#"<a href="/">Home</a>"#).await;

    let events = Mutex::new(Vec::new());
    let sink = |event: &CrawlEvent| events.lock().unwrap().push(event.clone());

    let engine = CrawlEngine::from_config(&create_test_config());
    let seed = format!("{}/", base_url);
    let report = engine.crawl_report(&seed, &sink).await.expect("Crawl failed");

    assert_eq!(report.summary.successful_crawls, 2);
    assert_eq!(report.top_pages[0].url, seed);
    assert_eq!(report.top_pages[0].references, 2);

    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("crawl-report.json");
    let summary_path = temp_dir.path().join("crawl-summary.md");
    write_json_report(&report, &json_path).unwrap();
    write_markdown_report(&report, &seed, &summary_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["successfulCrawls"], 2);
    assert_eq!(json["topPages"][0]["references"], 2);
    assert!(std::fs::read_to_string(&summary_path)
        .unwrap()
        .contains("# Docs-Mapper Crawl Summary"));

    let events = events.into_inner().unwrap();
    assert!(matches!(events.first(), Some(CrawlEvent::Started { .. })));
    assert!(matches!(events.last(), Some(CrawlEvent::Completed { .. })));
    let progress = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::Progress { .. }))
        .count();
    assert!(progress >= 2);
}
