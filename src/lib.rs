//! threadscrape: resumable feed-link discovery and concurrent comment
//! extraction over a driven browser.
//!
//! Two durable artifacts carry all crawl state: the append-only link log
//! (link identity, with a recoverable resume cursor) and the per-address
//! comment files (completion state). Discovery appends to the log;
//! extraction workers replay it through deterministic index-modulo
//! partitions and write one comment file per link. Both stages survive
//! restarts without re-work because resumption is derived from those two
//! artifacts alone.

pub mod address;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod link_log;
pub mod logging;
pub mod plugins;
pub mod renderer;
pub mod utils;

use std::sync::Arc;

pub use address::Address;
pub use config::ScrapeConfig;
pub use coordinator::{PartitionedReplay, run_extractors};
pub use discovery::LinkDiscovery;
pub use error::{ScrapeError, ScrapeResult};
pub use extraction::{CommentExtractor, CommentStore};
pub use link_log::{LinkLog, LinkRecord, ReplayStream, TailItem};
pub use plugins::PagePlugin;
pub use renderer::{ChromiumRenderer, PageElement, PageSurface, Renderer};

/// Run one link discovery session against the configured feed.
pub async fn run_discovery(config: &ScrapeConfig, renderer: &dyn Renderer) -> ScrapeResult<()> {
    let log = open_log(config).await?;
    LinkDiscovery::new(config.clone(), log).run(renderer).await?;
    Ok(())
}

/// Run the configured number of extraction workers over the persisted log.
pub async fn run_extraction(
    config: &ScrapeConfig,
    renderer: Arc<dyn Renderer>,
) -> ScrapeResult<()> {
    let log = open_log(config).await?;
    let store = open_store(config).await?;
    run_extractors(config, log, store, renderer).await?;
    Ok(())
}

/// Run discovery and extraction concurrently against one shared link log.
///
/// Extraction reads only from the persisted log, so the two stages couple
/// purely through the filesystem: discovery appends, workers tail.
pub async fn run_full_crawl(
    config: &ScrapeConfig,
    renderer: Arc<dyn Renderer>,
) -> ScrapeResult<()> {
    let log = open_log(config).await?;
    let store = open_store(config).await?;

    let mut discovery = LinkDiscovery::new(config.clone(), Arc::clone(&log));
    let discovery_task = discovery.run(renderer.as_ref());
    let extraction_task = run_extractors(config, log, store, Arc::clone(&renderer));

    let (discovered, extracted) = tokio::join!(discovery_task, extraction_task);
    discovered?;
    extracted?;
    Ok(())
}

async fn open_log(config: &ScrapeConfig) -> ScrapeResult<Arc<LinkLog>> {
    LinkLog::open(config.link_log_path())
        .await
        .map(Arc::new)
        .map_err(|e| ScrapeError::Storage(format!("{e:#}")))
}

async fn open_store(config: &ScrapeConfig) -> ScrapeResult<Arc<CommentStore>> {
    CommentStore::open(config.comment_dir())
        .await
        .map(Arc::new)
        .map_err(|e| ScrapeError::Storage(format!("{e:#}")))
}
