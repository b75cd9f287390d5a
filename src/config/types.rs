//! Core configuration type for crawl sessions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::builder::ScrapeConfigBuilder;

/// Configuration for one crawl session (discovery, extraction, or both).
///
/// All paths used by the crawl are derived from `storage_dir`:
/// the link log lives under `links/`, comment files under `comments/`,
/// and log output under `logs/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) feed_url: String,
    pub(crate) feed_link_selector: String,
    pub(crate) comment_selector: String,
    pub(crate) max_links: usize,
    pub(crate) link_batch_size: usize,
    pub(crate) comment_batch_size: usize,
    pub(crate) scroll_retries: u32,
    pub(crate) max_idle_rounds: u32,
    pub(crate) workers: usize,
    pub(crate) idle_timeout_secs: u64,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) headless: bool,
    /// Browser profile directory; a per-process temp dir when unset.
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl ScrapeConfig {
    /// Entry point to the typestate builder.
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }

    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    #[must_use]
    pub fn feed_link_selector(&self) -> &str {
        &self.feed_link_selector
    }

    #[must_use]
    pub fn comment_selector(&self) -> &str {
        &self.comment_selector
    }

    #[must_use]
    pub fn max_links(&self) -> usize {
        self.max_links
    }

    #[must_use]
    pub fn link_batch_size(&self) -> usize {
        self.link_batch_size
    }

    #[must_use]
    pub fn comment_batch_size(&self) -> usize {
        self.comment_batch_size
    }

    #[must_use]
    pub fn scroll_retries(&self) -> u32 {
        self.scroll_retries
    }

    #[must_use]
    pub fn max_idle_rounds(&self) -> u32 {
        self.max_idle_rounds
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// How long a worker waits on the shared link stream before terminating.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Budget for `navigate` (and initial settling) on any page.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    /// Durable link-log file, the only owner of link identity.
    #[must_use]
    pub fn link_log_path(&self) -> PathBuf {
        self.storage_dir.join("links").join("link_log.txt")
    }

    /// Directory of per-address comment files, the only owner of
    /// completion state.
    #[must_use]
    pub fn comment_dir(&self) -> PathBuf {
        self.storage_dir.join("comments")
    }

    /// Directory for rolling log-file output.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.storage_dir.join("logs")
    }
}
