//! Feed-page link discovery.
//!
//! Drives one page session through `Navigate → ScrollLoop → Flush`: scroll
//! the feed, let it settle, collect candidate links, address and dedup
//! them into an owned working set, and flush that set to the link log in
//! batches. The working set has exactly one writer, this engine, and the
//! log is reached only through `append_batch`, whose cursor skip makes the
//! repeated full-set flushes idempotent.
//!
//! Suspension points per iteration: scroll, settle wait, jittered backoff,
//! link query, per-element attribute reads, and any incremental flush.

use anyhow::{Context, Result};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::config::ScrapeConfig;
use crate::link_log::{LinkLog, LinkRecord};
use crate::renderer::{PageSurface, Renderer};
use url::Url;

/// Link discovery engine over a single feed-page session.
pub struct LinkDiscovery {
    config: ScrapeConfig,
    log: Arc<LinkLog>,
    seen: HashSet<Address>,
    working_set: Vec<LinkRecord>,
    flushed_len: usize,
}

impl LinkDiscovery {
    #[must_use]
    pub fn new(config: ScrapeConfig, log: Arc<LinkLog>) -> Self {
        Self {
            config,
            log,
            seen: HashSet::new(),
            working_set: Vec::new(),
            flushed_len: 0,
        }
    }

    /// Run one discovery session to completion.
    ///
    /// Navigation or scroll-loop failures end the session early but never
    /// skip the final flush: whatever the working set holds is offered to
    /// the log before returning.
    pub async fn run(&mut self, renderer: &dyn Renderer) -> Result<()> {
        let page = renderer.open_page().await?;

        info!(url = %self.config.feed_url(), "navigating to feed");
        let outcome = match page
            .navigate(self.config.feed_url(), self.config.navigation_timeout())
            .await
        {
            Ok(()) => self.scroll_and_collect(page.as_ref()).await,
            Err(e) => Err(e.context("feed navigation failed")),
        };
        if let Err(e) = outcome {
            error!("discovery session ended early: {e:#}");
        }

        self.flush().await;
        info!(links = self.working_set.len(), "discovery session finished");
        Ok(())
    }

    /// Scroll until the working set is full or the page stops growing.
    async fn scroll_and_collect(&mut self, page: &dyn PageSurface) -> Result<()> {
        let feed_base =
            Url::parse(self.config.feed_url()).context("feed URL does not parse")?;
        let mut prev_height = 0i64;
        let mut stalls = 0u32;

        while self.working_set.len() < self.config.max_links() {
            page.scroll_to_bottom().await?;
            page.wait_for_settled().await?;
            let jitter = Duration::from_millis(rand::rng().random_range(0..3_000));
            tokio::time::sleep(jitter).await;

            let elements = page.query(self.config.feed_link_selector()).await?;
            for element in &elements {
                let Some(href) = element.attribute("href").await? else {
                    continue;
                };
                let absolute = match feed_base.join(&href) {
                    Ok(url) => String::from(url),
                    Err(e) => {
                        warn!(href = %href, "dropping unresolvable link: {e}");
                        continue;
                    }
                };
                let address = Address::of_url(&absolute);
                if self.seen.insert(address) {
                    self.working_set.push(LinkRecord {
                        address,
                        url: absolute,
                    });
                }
            }

            if self.working_set.len() - self.flushed_len >= self.config.link_batch_size() {
                self.flush().await;
            }

            let height = page.scroll_height().await?;
            if height == prev_height {
                stalls += 1;
                debug!(stalls, max = self.config.scroll_retries(), "feed did not grow");
                if stalls >= self.config.scroll_retries() {
                    warn!("feed stopped growing; ending scroll loop");
                    break;
                }
            } else {
                stalls = 0;
            }
            prev_height = height;
        }

        Ok(())
    }

    /// Offer the full working set to the log; the cursor skip inside
    /// `append_batch` writes only the new suffix. Failed writes stay in
    /// the working set and are retried on the next flush.
    async fn flush(&mut self) {
        if self.working_set.is_empty() {
            return;
        }
        let written = self.log.append_batch(&self.working_set).await;
        if written > 0 {
            debug!(written, total = self.working_set.len(), "link batch flushed");
        }
        self.flushed_len = self.working_set.len();
    }

    /// Number of unique links collected so far in this session.
    #[must_use]
    pub fn collected(&self) -> usize {
        self.working_set.len()
    }
}
