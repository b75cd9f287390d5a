//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! The two required fields (`storage_dir`, then `feed_url`) advance the
//! builder's type state; `build()` only exists once both are present, so a
//! half-configured session cannot compile.

use std::marker::PhantomData;
use std::path::PathBuf;

use crate::error::ScrapeError;
use crate::utils::{
    DEFAULT_COMMENT_BATCH_SIZE, DEFAULT_COMMENT_SELECTOR, DEFAULT_FEED_LINK_SELECTOR,
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LINK_BATCH_SIZE, DEFAULT_MAX_IDLE_ROUNDS,
    DEFAULT_MAX_LINKS, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_SCROLL_RETRIES, DEFAULT_WORKERS,
};

use super::types::ScrapeConfig;

// Type states for the builder
pub struct WithStorageDir;
pub struct Complete;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) feed_url: Option<String>,
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
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            feed_url: None,
            feed_link_selector: DEFAULT_FEED_LINK_SELECTOR.to_string(),
            comment_selector: DEFAULT_COMMENT_SELECTOR.to_string(),
            max_links: DEFAULT_MAX_LINKS,
            link_batch_size: DEFAULT_LINK_BATCH_SIZE,
            comment_batch_size: DEFAULT_COMMENT_BATCH_SIZE,
            scroll_retries: DEFAULT_SCROLL_RETRIES,
            max_idle_rounds: DEFAULT_MAX_IDLE_ROUNDS,
            workers: DEFAULT_WORKERS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            headless: true,
            chrome_data_dir: None,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<()> {
    /// Set the storage root (required, first).
    #[must_use]
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithStorageDir> {
        ScrapeConfigBuilder {
            storage_dir: Some(dir.into()),
            feed_url: self.feed_url,
            feed_link_selector: self.feed_link_selector,
            comment_selector: self.comment_selector,
            max_links: self.max_links,
            link_batch_size: self.link_batch_size,
            comment_batch_size: self.comment_batch_size,
            scroll_retries: self.scroll_retries,
            max_idle_rounds: self.max_idle_rounds,
            workers: self.workers,
            idle_timeout_secs: self.idle_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<WithStorageDir> {
    /// Set the feed page URL (required, second).
    #[must_use]
    pub fn feed_url(self, url: impl Into<String>) -> ScrapeConfigBuilder<Complete> {
        ScrapeConfigBuilder {
            storage_dir: self.storage_dir,
            feed_url: Some(url.into()),
            feed_link_selector: self.feed_link_selector,
            comment_selector: self.comment_selector,
            max_links: self.max_links,
            link_batch_size: self.link_batch_size,
            comment_batch_size: self.comment_batch_size,
            scroll_retries: self.scroll_retries,
            max_idle_rounds: self.max_idle_rounds,
            workers: self.workers,
            idle_timeout_secs: self.idle_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl<State> ScrapeConfigBuilder<State> {
    #[must_use]
    pub fn feed_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.feed_link_selector = selector.into();
        self
    }

    #[must_use]
    pub fn comment_selector(mut self, selector: impl Into<String>) -> Self {
        self.comment_selector = selector.into();
        self
    }

    #[must_use]
    pub fn max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    #[must_use]
    pub fn link_batch_size(mut self, size: usize) -> Self {
        self.link_batch_size = size;
        self
    }

    #[must_use]
    pub fn comment_batch_size(mut self, size: usize) -> Self {
        self.comment_batch_size = size;
        self
    }

    #[must_use]
    pub fn scroll_retries(mut self, retries: u32) -> Self {
        self.scroll_retries = retries;
        self
    }

    #[must_use]
    pub fn max_idle_rounds(mut self, rounds: u32) -> Self {
        self.max_idle_rounds = rounds;
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn idle_timeout_secs(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }
}

impl ScrapeConfigBuilder<Complete> {
    /// Validate and produce the final config.
    pub fn build(self) -> Result<ScrapeConfig, ScrapeError> {
        let storage_dir = self
            .storage_dir
            .ok_or_else(|| ScrapeError::Config("storage_dir missing".into()))?;
        let feed_url = self
            .feed_url
            .ok_or_else(|| ScrapeError::Config("feed_url missing".into()))?;

        if feed_url.is_empty() {
            return Err(ScrapeError::Config("feed_url must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(ScrapeError::Config("workers must be at least 1".into()));
        }
        if self.link_batch_size == 0 || self.comment_batch_size == 0 {
            return Err(ScrapeError::Config(
                "batch sizes must be at least 1".into(),
            ));
        }

        Ok(ScrapeConfig {
            storage_dir,
            feed_url,
            feed_link_selector: self.feed_link_selector,
            comment_selector: self.comment_selector,
            max_links: self.max_links,
            link_batch_size: self.link_batch_size,
            comment_batch_size: self.comment_batch_size,
            scroll_retries: self.scroll_retries,
            max_idle_rounds: self.max_idle_rounds,
            workers: self.workers,
            idle_timeout_secs: self.idle_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
        })
    }
}
