//! End-to-end pipeline tests
//!
//! Pages are served by wiremock, fetched with the real `PageFetcher`, and
//! results land in a `MemoryChannel` where every publish and ack is checked.

use async_trait::async_trait;
use landing_crawler::config::{Config, ProxySettings};
use landing_crawler::crawler::{Coordinator, CrawlStats, HealthProbe, PageFetcher};
use landing_crawler::messages::{ErrorReport, LinkRecord};
use landing_crawler::queue::{MemoryChannel, EMPTY_RESULT_QUEUE, ERROR_QUEUE, LINKS_QUEUE};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Health probe with a fixed answer
struct FixedProbe(bool);

#[async_trait]
impl HealthProbe for FixedProbe {
    async fn is_healthy(&self) -> bool {
        self.0
    }
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn job(url: &str, url_id: Value) -> String {
    json!({"url": url, "url_id": url_id}).to_string()
}

/// Runs every queued job on a closed channel and returns the stats
async fn drain(channel: Arc<MemoryChannel>, config: &Config, healthy: bool) -> CrawlStats {
    channel.close();
    let fetcher = Arc::new(PageFetcher::new(config).expect("Failed to build fetcher"));
    let mut coordinator = Coordinator::new(channel, fetcher, Arc::new(FixedProbe(healthy)));

    tokio::time::timeout(
        Duration::from_secs(30),
        coordinator.run(std::future::pending::<()>()),
    )
    .await
    .expect("Consumer loop did not finish")
    .expect("Consumer loop failed")
}

fn proxied_config(endpoint: &str) -> Config {
    let mut config = Config::default();
    config.proxy = ProxySettings {
        enabled: true,
        http: Some(endpoint.to_string()),
        https: Some(endpoint.to_string()),
        ..ProxySettings::default()
    };
    config
}

#[tokio::test]
async fn test_reference_page_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/x/",
        200,
        r#"<html><body>
            <a href="y">Y</a>
            <a href="/z">Z</a>
            <a href="mailto:a@b.com">Mail</a>
        </body></html>"#,
    )
    .await;

    let channel = Arc::new(MemoryChannel::new());
    let tag = channel.push(job(&format!("{}/x/", base), json!(1)));

    let stats = drain(channel.clone(), &Config::default(), true).await;

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.linked, 1);
    assert_eq!(channel.publish_count(), 1);
    assert_eq!(channel.ack_count(tag), 1);

    let batch: Vec<LinkRecord> =
        serde_json::from_str(&channel.messages_for_queue(LINKS_QUEUE)[0]).unwrap();
    let urls: Vec<&str> = batch.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/x/y", base), format!("{}/z", base)]);
    assert!(batch.iter().all(|r| r.source_url_id == json!(1)));
}

#[tokio::test]
async fn test_links_are_normalized_and_deduplicated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        200,
        &format!(
            r##"<html><body>
                <a href="/a?page=2">A1</a>
                <a href="/a#top">A2</a>
                <a href="{}/a">A3</a>
                <a href="/b?x=1#y">B</a>
                <a href="tel:+15555555">Call</a>
            </body></html>"##,
            base
        ),
    )
    .await;

    let channel = Arc::new(MemoryChannel::new());
    channel.push(job(&format!("{}/", base), json!("page-7")));

    drain(channel.clone(), &Config::default(), true).await;

    let batch: Vec<LinkRecord> =
        serde_json::from_str(&channel.messages_for_queue(LINKS_QUEUE)[0]).unwrap();
    assert_eq!(batch.len(), 2);
    for record in &batch {
        assert_eq!(record.source_url_id, json!("page-7"));
        assert!(!record.url.contains('?') && !record.url.contains('#'));
        assert!(!record.url.starts_with("tel:"));
    }
}

#[tokio::test]
async fn test_mixed_batch_of_jobs() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/links",
        200,
        r#"<a href="/one">1</a><a href="/two">2</a><a href="/three">3</a>"#,
    )
    .await;
    mount_page(&server, "/empty", 200, "<html><body><p>Nothing here</p></body></html>").await;
    mount_page(&server, "/gone", 404, r#"<a href="/home">home</a>"#).await;

    let channel = Arc::new(MemoryChannel::new());
    let tags = vec![
        channel.push(job(&format!("{}/links", base), json!(10))),
        channel.push(job(&format!("{}/empty", base), json!(11))),
        channel.push(job(&format!("{}/gone", base), json!(12))),
        channel.push("{ this is not json"),
        channel.push(job("http://127.0.0.1:1/unreachable", json!(14))),
    ];

    let stats = drain(channel.clone(), &Config::default(), true).await;

    assert_eq!(stats.processed, 5);
    assert_eq!(stats.linked, 2);
    assert_eq!(stats.links_published, 4);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.reported, 2);
    assert_eq!(stats.unacknowledged, 0);

    for tag in tags {
        assert_eq!(channel.ack_count(tag), 1, "delivery {} not acked once", tag);
    }

    let batches = channel.messages_for_queue(LINKS_QUEUE);
    assert_eq!(batches.len(), 2);
    let first: Vec<LinkRecord> = serde_json::from_str(&batches[0]).unwrap();
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|r| r.source_url_id == json!(10)));

    assert_eq!(
        channel.messages_for_queue(EMPTY_RESULT_QUEUE),
        vec![json!({"source_url_id": 11}).to_string()]
    );

    let reports: Vec<ErrorReport> = channel
        .messages_for_queue(ERROR_QUEUE)
        .iter()
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].url_id, None);
    assert_eq!(reports[0].url, None);
    assert_eq!(reports[1].url_id, Some(json!(14)));
    assert!(reports[1]
        .error_message
        .starts_with("Failed to process http://127.0.0.1:1/unreachable:"));
}

#[tokio::test]
async fn test_proxy_error_with_healthy_proxy_is_absorbed() {
    let channel = Arc::new(MemoryChannel::new());
    let tag = channel.push(job("http://example.com/", json!(20)));

    // Nothing listens on port 1
    let stats = drain(channel.clone(), &proxied_config("127.0.0.1:1"), true).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.reported, 0);
    assert_eq!(channel.publish_count(), 0);
    assert_eq!(channel.ack_count(tag), 1);
}

#[tokio::test]
async fn test_proxy_error_with_unhealthy_proxy_is_reported() {
    let channel = Arc::new(MemoryChannel::new());
    let tag = channel.push(job("http://example.com/", json!(21)));

    let stats = drain(channel.clone(), &proxied_config("127.0.0.1:1"), false).await;

    assert_eq!(stats.reported, 1);
    let reports = channel.messages_for_queue(ERROR_QUEUE);
    assert_eq!(reports.len(), 1);

    let report: ErrorReport = serde_json::from_str(&reports[0]).unwrap();
    assert_eq!(report.url_id, Some(json!(21)));
    assert!(report
        .error_message
        .starts_with("Failed to process http://example.com/: Proxy error."));
    assert_eq!(channel.ack_count(tag), 1);
}

#[tokio::test]
async fn test_pages_fetched_through_proxy() {
    // The mock server plays the proxy: plain HTTP requests arrive at it in
    // absolute form and it answers them directly.
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/via-proxy">p</a>"#))
        .expect(1)
        .mount(&proxy)
        .await;

    let channel = Arc::new(MemoryChannel::new());
    channel.push(job("http://site.invalid/start", json!(30)));

    let config = proxied_config(&proxy.address().to_string());
    let stats = drain(channel.clone(), &config, true).await;

    assert_eq!(stats.linked, 1);
    let batch: Vec<LinkRecord> =
        serde_json::from_str(&channel.messages_for_queue(LINKS_QUEUE)[0]).unwrap();
    assert_eq!(batch[0].url, "http://site.invalid/via-proxy");
}

#[tokio::test]
async fn test_failed_publish_does_not_stop_the_loop() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", 200, r#"<a href="/next">next</a>"#).await;

    let channel = Arc::new(MemoryChannel::new());
    channel.fail_publishes_to(LINKS_QUEUE);
    let first = channel.push(job(&format!("{}/", base), json!(40)));
    let second = channel.push(job(&format!("{}/", base), json!(41)));

    let stats = drain(channel.clone(), &Config::default(), true).await;

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(channel.messages_for_queue(ERROR_QUEUE).len(), 2);
    assert_eq!(channel.ack_count(first), 1);
    assert_eq!(channel.ack_count(second), 1);
}

#[tokio::test]
async fn test_shutdown_stops_idle_loop() {
    let channel = Arc::new(MemoryChannel::new());
    let fetcher = Arc::new(PageFetcher::new(&Config::default()).unwrap());
    let mut coordinator = Coordinator::new(channel, fetcher, Arc::new(FixedProbe(true)));

    let stats = tokio::time::timeout(Duration::from_secs(5), coordinator.run(async {}))
        .await
        .expect("Consumer loop ignored shutdown")
        .expect("Consumer loop failed");

    assert_eq!(stats, CrawlStats::default());
}
