//! Comment extraction.
//!
//! One worker owns one page session and consumes its partition of the link
//! log's replay stream. Per link: `Navigate → ExtractLoop → Save`. Each
//! loop iteration runs the plugin pipeline, harvests the comment snippets
//! currently visible, keeps the ones not yet collected, flushes the
//! collection incrementally once it has grown by a batch, and scrolls for
//! more. The loop ends after a bounded number of iterations that produce
//! neither new snippets nor scroll growth.
//!
//! Durability contract: the comment file is claimed (created) before
//! navigation, so a link that is started is permanently skippable on any
//! future run, and a final flush of unflushed snippets always happens
//! before the worker moves on.

pub mod comment_store;

pub use comment_store::{CommentFile, CommentStore};

use anyhow::Result;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::coordinator::PartitionedReplay;
use crate::link_log::{LinkRecord, TailItem};
use crate::plugins::PagePlugin;
use crate::renderer::{PageSurface, Renderer};
use crate::utils::STREAM_POLL_INTERVAL_MS;

/// Comment extraction engine for one worker.
pub struct CommentExtractor {
    config: ScrapeConfig,
    store: Arc<CommentStore>,
    pipeline: Vec<PagePlugin>,
    worker_id: usize,
}

impl CommentExtractor {
    #[must_use]
    pub fn new(config: ScrapeConfig, store: Arc<CommentStore>, worker_id: usize) -> Self {
        Self {
            config,
            store,
            pipeline: PagePlugin::default_pipeline(),
            worker_id,
        }
    }

    /// Replace the default plugin pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Vec<PagePlugin>) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Consume the worker's partition of the replay stream until it is
    /// drained or stalls past the idle timeout.
    ///
    /// Waiting on the stream is a bounded poll: every
    /// [`STREAM_POLL_INTERVAL_MS`] the stream is pulled again, and once
    /// the idle budget elapses without a record the worker terminates:
    /// with a plain notice when the log was simply drained, with a warning
    /// when it ended on a torn record that never completed.
    pub async fn run(&self, mut links: PartitionedReplay, renderer: &dyn Renderer) -> Result<()> {
        let page = renderer.open_page().await?;
        let poll = Duration::from_millis(STREAM_POLL_INTERVAL_MS);
        let mut idled = Duration::ZERO;
        let mut processed = 0usize;

        loop {
            match links.next().await {
                TailItem::Record(record) => {
                    idled = Duration::ZERO;
                    self.process_link(page.as_ref(), &record).await;
                    processed += 1;
                }
                TailItem::Pending { torn } => {
                    if idled >= self.config.idle_timeout() {
                        if torn {
                            warn!(
                                worker = self.worker_id,
                                "link stream stalled on an incomplete record; stopping"
                            );
                        } else {
                            info!(
                                worker = self.worker_id,
                                "no new links within {:?}; link stream drained",
                                self.config.idle_timeout()
                            );
                        }
                        break;
                    }
                    tokio::time::sleep(poll).await;
                    idled += poll;
                }
            }
        }

        info!(worker = self.worker_id, processed, "extraction worker finished");
        Ok(())
    }

    /// Handle one link end to end. Never propagates page failures: the
    /// worst outcome is an early save of whatever was collected.
    async fn process_link(&self, page: &dyn PageSurface, record: &LinkRecord) {
        let mut file = match self.store.claim(record.address).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!(worker = self.worker_id, url = %record.url, "already claimed; skipping");
                return;
            }
            Err(e) => {
                error!(worker = self.worker_id, url = %record.url, "could not claim comment file: {e:#}");
                return;
            }
        };

        info!(worker = self.worker_id, url = %record.url, "extracting comments");
        if let Err(e) = page
            .navigate(&record.url, self.config.navigation_timeout())
            .await
        {
            // The claimed (empty) file stands: this link will not be
            // retried on future runs, matching the at-most-once contract.
            warn!(worker = self.worker_id, url = %record.url, "navigation failed: {e:#}");
            return;
        }

        let mut collected: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut flushed = 0usize;
        let mut idle_rounds = 0u32;

        while idle_rounds < self.config.max_idle_rounds() {
            for plugin in &self.pipeline {
                match plugin.attempt(page).await {
                    Ok(true) => debug!(plugin = plugin.describe(), "plugin made progress"),
                    Ok(false) => {}
                    Err(e) => warn!(plugin = plugin.describe(), "plugin failed: {e:#}"),
                }
            }

            // Difference against the running collection only; repeats
            // within one snapshot are kept as-is.
            let fresh = match self.visible_comments(page).await {
                Ok(snippets) => snippets
                    .into_iter()
                    .filter(|snippet| !seen.contains(snippet))
                    .collect::<Vec<_>>(),
                Err(e) => {
                    error!(worker = self.worker_id, url = %record.url, "comment query failed: {e:#}");
                    break;
                }
            };

            let grew = !fresh.is_empty();
            if grew {
                debug!(worker = self.worker_id, count = fresh.len(), "new comments collected");
                seen.extend(fresh.iter().cloned());
                collected.extend(fresh);
                if collected.len() - flushed >= self.config.comment_batch_size() {
                    match file.append(&collected[flushed..]).await {
                        Ok(()) => flushed = collected.len(),
                        Err(e) => error!(worker = self.worker_id, "incremental save failed: {e:#}"),
                    }
                }
            }

            let scrolled = self.scroll_for_more(page).await;
            if !scrolled && !grew {
                idle_rounds += 1;
                debug!(
                    worker = self.worker_id,
                    idle_rounds,
                    max = self.config.max_idle_rounds(),
                    "no progress this round"
                );
            } else {
                idle_rounds = 0;
            }
        }

        if flushed < collected.len()
            && let Err(e) = file.append(&collected[flushed..]).await
        {
            error!(worker = self.worker_id, url = %record.url, "final save failed: {e:#}");
        }
        info!(worker = self.worker_id, total = collected.len(), url = %record.url, "link finished");
    }

    /// Text of every element currently matching the comment selector.
    async fn visible_comments(&self, page: &dyn PageSurface) -> Result<Vec<String>> {
        let elements = page.query(self.config.comment_selector()).await?;
        let mut snippets = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(text) = element.text().await? {
                snippets.push(text);
            }
        }
        debug!(count = snippets.len(), "comments visible");
        Ok(snippets)
    }

    /// Scroll and report whether the page extent grew. Failures are
    /// downgraded to "no growth"; stalled progress is a termination
    /// condition, not an error.
    async fn scroll_for_more(&self, page: &dyn PageSurface) -> bool {
        let result: Result<bool> = async {
            let before = page.scroll_height().await?;
            page.scroll_to_bottom().await?;
            page.wait_for_settled().await?;
            let jitter = Duration::from_millis(rand::rng().random_range(0..2_000));
            tokio::time::sleep(jitter).await;
            let after = page.scroll_height().await?;
            Ok(after > before)
        }
        .await;
        match result {
            Ok(grew) => grew,
            Err(e) => {
                warn!(worker = self.worker_id, "scroll failed: {e:#}");
                false
            }
        }
    }
}
