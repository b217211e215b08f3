//! Bounded-concurrency FIFO scheduler.
//!
//! Runs a fixed-size pool of workers over the shared [`DownloadQueue`].
//! Each pool slot loops: claim the next descriptor, fetch it, record the
//! outcome, repeat. The moment a fetch resolves its slot pulls the next
//! queued item, so the pool stays work-conserving without any reordering
//! or preemption. `run` resolves exactly once, when the queue is empty and
//! every in-flight fetch has completed.

use crate::downloader::progress::ResultAggregator;
use crate::downloader::queue::DownloadQueue;
use crate::downloader::worker::DownloadWorker;
use crate::shutdown::SharedShutdown;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed-size worker pool over a shared download queue.
#[derive(Debug)]
pub struct ConcurrencyScheduler {
    parallelism: usize,
    shutdown: SharedShutdown,
}

impl ConcurrencyScheduler {
    /// Create a scheduler with at most `parallelism` concurrent fetches.
    pub fn new(parallelism: usize, shutdown: SharedShutdown) -> Self {
        Self {
            parallelism: parallelism.max(1),
            shutdown,
        }
    }

    /// Drain the queue, recording one outcome per descriptor.
    ///
    /// When shutdown is requested, slots stop claiming new descriptors but
    /// in-flight fetches finish, so no unverified temp files are orphaned.
    pub async fn run(
        &self,
        queue: Arc<DownloadQueue>,
        worker: Arc<DownloadWorker>,
        aggregator: Arc<ResultAggregator>,
    ) {
        let slots = self.parallelism.min(queue.len().max(1));
        debug!("starting {} download slot(s)", slots);

        let mut pool = Vec::with_capacity(slots);
        for slot in 0..slots {
            let queue = Arc::clone(&queue);
            let worker = Arc::clone(&worker);
            let aggregator = Arc::clone(&aggregator);
            let shutdown = Arc::clone(&self.shutdown);

            pool.push(async move {
                loop {
                    if shutdown.is_shutdown_requested() {
                        debug!("slot {}: shutdown requested, not claiming more work", slot);
                        break;
                    }
                    let Some(descriptor) = queue.pop_next() else {
                        break;
                    };
                    let outcome = worker.fetch(&descriptor).await;
                    aggregator.record(&descriptor.file_name, outcome);
                }
            });
        }

        futures::future::join_all(pool).await;

        if self.shutdown.is_shutdown_requested() && !queue.is_empty() {
            info!("stopped early, {} file(s) left unclaimed", queue.len());
        }
    }
}
