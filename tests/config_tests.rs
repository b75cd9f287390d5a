//! Tests for the type-safe configuration builder.

use std::path::PathBuf;
use threadscrape::{ScrapeConfig, ScrapeError};

#[test]
fn builder_fills_defaults() {
    let config = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/tmp/scrape"))
        .feed_url("https://example.com/feed/")
        .build()
        .unwrap();

    assert_eq!(config.feed_url(), "https://example.com/feed/");
    assert_eq!(config.max_links(), 10_000);
    assert_eq!(config.link_batch_size(), 200);
    assert_eq!(config.comment_batch_size(), 50);
    assert_eq!(config.scroll_retries(), 5);
    assert_eq!(config.max_idle_rounds(), 5);
    assert_eq!(config.workers(), 10);
    assert!(config.headless());
    assert!(config.chrome_data_dir().is_none());
}

#[test]
fn derived_paths_hang_off_storage_dir() {
    let config = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/data"))
        .feed_url("https://example.com/feed/")
        .build()
        .unwrap();

    assert_eq!(
        config.link_log_path(),
        PathBuf::from("/data/links/link_log.txt")
    );
    assert_eq!(config.comment_dir(), PathBuf::from("/data/comments"));
    assert_eq!(config.log_dir(), PathBuf::from("/data/logs"));
}

#[test]
fn builder_rejects_zero_workers() {
    let result = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/tmp/scrape"))
        .feed_url("https://example.com/feed/")
        .workers(0)
        .build();
    assert!(matches!(result, Err(ScrapeError::Config(_))));
}

#[test]
fn builder_rejects_empty_feed_url() {
    let result = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/tmp/scrape"))
        .feed_url("")
        .build();
    assert!(matches!(result, Err(ScrapeError::Config(_))));
}

#[test]
fn builder_rejects_zero_batch_sizes() {
    let result = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/tmp/scrape"))
        .feed_url("https://example.com/feed/")
        .link_batch_size(0)
        .build();
    assert!(matches!(result, Err(ScrapeError::Config(_))));
}

#[test]
fn optional_fields_override_defaults() {
    let config = ScrapeConfig::builder()
        .storage_dir(PathBuf::from("/tmp/scrape"))
        .feed_url("https://example.com/feed/")
        .feed_link_selector("a.post")
        .comment_selector("p.comment")
        .max_links(10)
        .link_batch_size(2)
        .comment_batch_size(3)
        .scroll_retries(1)
        .max_idle_rounds(2)
        .workers(3)
        .idle_timeout_secs(5)
        .navigation_timeout_secs(7)
        .headless(false)
        .chrome_data_dir(PathBuf::from("/tmp/profile"))
        .build()
        .unwrap();

    assert_eq!(config.feed_link_selector(), "a.post");
    assert_eq!(config.comment_selector(), "p.comment");
    assert_eq!(config.max_links(), 10);
    assert_eq!(config.workers(), 3);
    assert_eq!(config.idle_timeout().as_secs(), 5);
    assert_eq!(config.navigation_timeout().as_secs(), 7);
    assert!(!config.headless());
    assert_eq!(
        config.chrome_data_dir(),
        Some(&PathBuf::from("/tmp/profile"))
    );
}
