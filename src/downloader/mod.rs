//! Download engine: queue, worker pool, and result accounting.
//!
//! The engine consumes a validated [`DownloadRequest`](crate::plan::DownloadRequest),
//! plans the resource descriptors, and drains them through a bounded pool of
//! streaming workers. Per-resource failures are classified and tallied, never
//! propagated — a run only errors out before any network activity starts.
//!
//! ```no_run
//! use binance_vision_downloader::catalog::Product;
//! use binance_vision_downloader::dates::Granularity;
//! use binance_vision_downloader::downloader::DownloadEngine;
//! use binance_vision_downloader::plan::DownloadRequest;
//! use binance_vision_downloader::shutdown::ShutdownCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = DownloadRequest {
//!     product: Product::Spot,
//!     data_type: "klines".to_string(),
//!     symbols: vec!["BTCUSDT".to_string()],
//!     intervals: Some(vec!["1h".to_string()]),
//!     granularity: Granularity::Daily,
//!     dates: vec!["2024-01-01".to_string()],
//!     output_dir: ".".into(),
//!     parallelism: 5,
//! };
//!
//! let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
//! let engine = DownloadEngine::new(ShutdownCoordinator::shared())?;
//! let summary = engine.run(&request, events).await;
//! println!("downloaded {}/{}", summary.success, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod worker;

pub use progress::{DownloadSummary, Outcome, ProgressCounters, ProgressEvent, ResultAggregator};
pub use queue::DownloadQueue;
pub use scheduler::ConcurrencyScheduler;
pub use worker::DownloadWorker;

use crate::plan::{self, DownloadRequest, VISION_BASE_URL};
use crate::shutdown::SharedShutdown;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Engine construction errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    ClientError(String),
}

/// Ties the planner, queue, scheduler, and aggregator together.
#[derive(Debug)]
pub struct DownloadEngine {
    client: Client,
    base_url: String,
    shutdown: SharedShutdown,
}

impl DownloadEngine {
    /// Create an engine pointed at the Binance Vision CDN.
    pub fn new(shutdown: SharedShutdown) -> Result<Self, EngineError> {
        Self::with_base_url(VISION_BASE_URL.to_string(), shutdown)
    }

    /// Create an engine with a custom base URL (for testing).
    pub fn with_base_url(
        base_url: String,
        shutdown: SharedShutdown,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .build()
            .map_err(|e| EngineError::ClientError(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            shutdown,
        })
    }

    /// Run the full download: plan, schedule, tally.
    ///
    /// Emits one [`ProgressEvent`] per completed resource on `events` and
    /// returns the final summary once every planned descriptor has exactly
    /// one recorded outcome (or the queue was cut short by shutdown).
    pub async fn run(
        &self,
        request: &DownloadRequest,
        events: UnboundedSender<ProgressEvent>,
    ) -> DownloadSummary {
        let descriptors = plan::plan(request, &self.base_url);
        info!(
            "planned {} file(s): {} {} data, {} symbol(s)",
            descriptors.len(),
            request.granularity,
            request.data_type,
            request.symbols.len(),
        );

        let total = descriptors.len();
        let queue = Arc::new(DownloadQueue::new(descriptors));
        let aggregator = Arc::new(ResultAggregator::new(total, events));
        let worker = Arc::new(DownloadWorker::new(
            self.client.clone(),
            request.output_dir.clone(),
        ));

        let scheduler = ConcurrencyScheduler::new(request.parallelism, self.shutdown.clone());
        scheduler
            .run(queue, worker, Arc::clone(&aggregator))
            .await;

        aggregator.summary()
    }
}
