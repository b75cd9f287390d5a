//! Discovery engine behavior against a scripted feed page.

mod common;

use common::{FakeElement, FakePage, FakeRenderer, Round};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use threadscrape::{LinkDiscovery, LinkLog, ScrapeConfig, TailItem};

const LINK_SELECTOR: &str = "a.post-link";
const FEED_URL: &str = "https://example.com/feed/";

fn config(dir: &TempDir, batch: usize, retries: u32, max_links: usize) -> ScrapeConfig {
    ScrapeConfig::builder()
        .storage_dir(dir.path())
        .feed_url(FEED_URL)
        .feed_link_selector(LINK_SELECTOR)
        .link_batch_size(batch)
        .scroll_retries(retries)
        .max_links(max_links)
        .build()
        .unwrap()
}

fn link(href: &str) -> FakeElement {
    FakeElement::with_href(href)
}

async fn drain_urls(log: &LinkLog) -> Vec<String> {
    let mut stream = log.replay(HashSet::new());
    let mut urls = Vec::new();
    loop {
        match stream.next().await {
            TailItem::Record(record) => urls.push(record.url),
            TailItem::Pending { .. } => return urls,
        }
    }
}

/// Three links surfacing over two scrolls with batch threshold 2: the log
/// receives A and B from the incremental flush, then C from the final
/// flush, in render order.
#[tokio::test(start_paused = true)]
async fn batches_flush_in_render_order() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 2, 2, 100);
    let log = Arc::new(LinkLog::open(config.link_log_path()).await.unwrap());

    let page = FakePage::scripted(vec![
        Round::new(100),
        Round::new(200).with(LINK_SELECTOR, vec![link("/a"), link("/b")]),
        Round::new(300).with(LINK_SELECTOR, vec![link("/a"), link("/b"), link("/c")]),
        Round::new(300).with(LINK_SELECTOR, vec![link("/a"), link("/b"), link("/c")]),
        Round::new(300).with(LINK_SELECTOR, vec![link("/a"), link("/b"), link("/c")]),
    ]);
    let renderer = FakeRenderer::single(page.clone());

    let mut discovery = LinkDiscovery::new(config, Arc::clone(&log));
    discovery.run(&renderer).await.unwrap();

    assert_eq!(discovery.collected(), 3);
    assert_eq!(
        drain_urls(&log).await,
        vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
            "https://example.com/c".to_string(),
        ]
    );
    assert_eq!(page.navigations().await, vec![FEED_URL.to_string()]);
}

/// Hrefs seen on multiple scrolls produce one record each.
#[tokio::test(start_paused = true)]
async fn repeated_hrefs_are_deduplicated() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 10, 2, 100);
    let log = Arc::new(LinkLog::open(config.link_log_path()).await.unwrap());

    let page = FakePage::scripted(vec![
        Round::new(100),
        Round::new(200).with(LINK_SELECTOR, vec![link("/a"), link("/a"), link("/b")]),
        Round::new(200).with(LINK_SELECTOR, vec![link("/b"), link("/a")]),
        Round::new(200).with(LINK_SELECTOR, vec![link("/a")]),
    ]);
    let renderer = FakeRenderer::single(page);

    let mut discovery = LinkDiscovery::new(config, Arc::clone(&log));
    discovery.run(&renderer).await.unwrap();

    assert_eq!(
        drain_urls(&log).await,
        vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ]
    );
}

/// A page whose scroll extent never grows ends the session after the
/// configured number of consecutive stalls, and the final flush still
/// lands whatever was collected.
#[tokio::test(start_paused = true)]
async fn stuck_page_terminates_after_retries() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 100, 3, 100);
    let log = Arc::new(LinkLog::open(config.link_log_path()).await.unwrap());

    let page = FakePage::scripted(vec![
        Round::new(100).with(LINK_SELECTOR, vec![link("/only")]),
    ]);
    let renderer = FakeRenderer::single(page);

    let mut discovery = LinkDiscovery::new(config, Arc::clone(&log));
    discovery.run(&renderer).await.unwrap();

    // Collected below the batch threshold, so only the final flush wrote it.
    assert_eq!(drain_urls(&log).await, vec!["https://example.com/only".to_string()]);
}

/// The working-set cap stops the session even while the page keeps growing.
#[tokio::test(start_paused = true)]
async fn max_links_caps_the_session() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 1, 5, 2);
    let log = Arc::new(LinkLog::open(config.link_log_path()).await.unwrap());

    let page = FakePage::scripted(vec![
        Round::new(100),
        Round::new(200).with(LINK_SELECTOR, vec![link("/a"), link("/b"), link("/c")]),
        Round::new(300).with(LINK_SELECTOR, vec![link("/d")]),
    ]);
    let renderer = FakeRenderer::single(page);

    let mut discovery = LinkDiscovery::new(config, Arc::clone(&log));
    discovery.run(&renderer).await.unwrap();

    // The cap is checked between iterations, so the first scroll's links
    // all land but no further scroll happens.
    assert_eq!(
        drain_urls(&log).await,
        vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
            "https://example.com/c".to_string(),
        ]
    );
}

/// Navigation failure still runs (and survives) the final flush.
#[tokio::test(start_paused = true)]
async fn failed_navigation_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 2, 2, 100);
    let log = Arc::new(LinkLog::open(config.link_log_path()).await.unwrap());

    let renderer = FakeRenderer::single(FakePage::failing_navigation());
    let mut discovery = LinkDiscovery::new(config, Arc::clone(&log));
    discovery.run(&renderer).await.unwrap();

    assert!(drain_urls(&log).await.is_empty());
}
