//! Multi-instance extraction coordinator.
//!
//! Fans the link log's replay stream out across `N` extraction workers.
//! Partitioning is derived, not stored: within one replay pass, the record
//! at 0-based stream index `i` belongs to worker `i mod N`. Every index
//! lands on exactly one worker and the union of all partitions is the full
//! pass, so no two workers ever claim the same comment file as long as the
//! log order is shared, which it is: each worker replays the same
//! durable file.

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::ScrapeConfig;
use crate::extraction::{CommentExtractor, CommentStore};
use crate::link_log::{LinkLog, ReplayStream, TailItem};
use crate::renderer::Renderer;

/// A worker's view of one replay pass: records whose stream index maps to
/// `worker_id` under index-modulo assignment.
pub struct PartitionedReplay {
    inner: ReplayStream,
    worker_id: usize,
    total_workers: usize,
    index: usize,
}

impl PartitionedReplay {
    /// # Panics
    /// Panics if `total_workers` is zero or `worker_id` is out of range;
    /// both are construction bugs, not runtime conditions.
    #[must_use]
    pub fn new(inner: ReplayStream, worker_id: usize, total_workers: usize) -> Self {
        assert!(total_workers > 0, "total_workers must be at least 1");
        assert!(worker_id < total_workers, "worker_id out of range");
        Self {
            inner,
            worker_id,
            total_workers,
            index: 0,
        }
    }

    /// Pull the next record assigned to this worker, forwarding the
    /// stream's pending state when the log has no more durable records.
    pub async fn next(&mut self) -> TailItem {
        loop {
            match self.inner.next().await {
                TailItem::Record(record) => {
                    let index = self.index;
                    self.index += 1;
                    if index % self.total_workers == self.worker_id {
                        return TailItem::Record(record);
                    }
                }
                pending @ TailItem::Pending { .. } => return pending,
            }
        }
    }
}

/// Build `N` extraction workers over partitioned views of one replay pass
/// and run them concurrently to completion.
///
/// Each worker scans the completion set itself at stream creation, applies
/// its own idle-timeout policy, and a worker failing (e.g. its page session
/// cannot be opened) is logged without aborting the others.
pub async fn run_extractors(
    config: &ScrapeConfig,
    log: Arc<LinkLog>,
    store: Arc<CommentStore>,
    renderer: Arc<dyn Renderer>,
) -> Result<()> {
    let total_workers = config.workers();
    info!(total_workers, "starting extraction workers");

    let mut workers = Vec::with_capacity(total_workers);
    for worker_id in 0..total_workers {
        let extractor = CommentExtractor::new(config.clone(), Arc::clone(&store), worker_id);
        let log = Arc::clone(&log);
        let store = Arc::clone(&store);
        let renderer = Arc::clone(&renderer);
        workers.push(async move {
            let completed = store.completed_addresses().await;
            let links = PartitionedReplay::new(log.replay(completed), worker_id, total_workers);
            extractor.run(links, renderer.as_ref()).await
        });
    }

    for (worker_id, result) in join_all(workers).await.into_iter().enumerate() {
        if let Err(e) = result {
            error!(worker = worker_id, "extraction worker failed: {e:#}");
        }
    }
    info!("all extraction workers finished");
    Ok(())
}
