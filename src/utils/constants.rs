//! Shared configuration constants for threadscrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default feed page to discover thread links on.
pub const DEFAULT_FEED_URL: &str = "https://www.reddit.com/r/yahoo/";

/// Selector matching thread links on the feed page.
///
/// Scoped to the feed container so pinned/sidebar links are not collected.
pub const DEFAULT_FEED_LINK_SELECTOR: &str =
    r#"shreddit-feed a[slot="full-post-link"][href*="/r/yahoo/comments/"]"#;

/// Selector matching visible comment text paragraphs on a thread page.
pub const DEFAULT_COMMENT_SELECTOR: &str = r#"div[id="-post-rtjson-content"] p"#;

/// Maximum number of links a discovery session will collect.
pub const DEFAULT_MAX_LINKS: usize = 10_000;

/// Link records accumulated before an incremental link-log flush.
///
/// Larger batches mean fewer write sections but more re-collection after a
/// crash; 200 keeps the window under one feed-scroll of links.
pub const DEFAULT_LINK_BATCH_SIZE: usize = 200;

/// Comment snippets accumulated before an incremental comment-file flush.
pub const DEFAULT_COMMENT_BATCH_SIZE: usize = 50;

/// Consecutive scrolls without page growth before discovery gives up.
pub const DEFAULT_SCROLL_RETRIES: u32 = 5;

/// Consecutive extraction iterations with no new comments and no scroll
/// growth before a thread page is considered fully harvested.
pub const DEFAULT_MAX_IDLE_ROUNDS: u32 = 5;

/// Concurrent comment-extraction workers sharing one replay pass.
pub const DEFAULT_WORKERS: usize = 10;

/// Seconds a worker waits on the shared link stream before terminating.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Seconds allowed for page navigation before the link is abandoned.
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// Bounded click attempts per page element.
pub const CLICK_RETRIES: u32 = 3;

/// Ceiling in milliseconds for the randomized per-attempt click timeout.
pub const CLICK_TIMEOUT_CEILING_MS: u64 = 500;

/// Interval between polls of the link stream while a worker is idle.
pub const STREAM_POLL_INTERVAL_MS: u64 = 250;

/// Chrome user agent string for hardened launches
///
/// Chrome releases new stable versions ~every 4 weeks; refresh this
/// periodically to stay within a plausible version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
