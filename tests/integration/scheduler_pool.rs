//! Scheduler pool behavior: exact accounting for any parallelism.

use binance_vision_downloader::catalog::Product;
use binance_vision_downloader::dates::Granularity;
use binance_vision_downloader::downloader::{
    ConcurrencyScheduler, DownloadQueue, DownloadWorker, ResultAggregator,
};
use binance_vision_downloader::plan::{plan, DownloadRequest, ResourceDescriptor};
use binance_vision_downloader::shutdown::ShutdownCoordinator;
use httpmock::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const PAYLOAD: &[u8] = b"scheduler test payload";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Plan one descriptor per day of January against the mock server.
fn descriptors(base_url: &str, output_dir: &Path, days: usize) -> Vec<ResourceDescriptor> {
    let request = DownloadRequest {
        product: Product::Spot,
        data_type: "trades".to_string(),
        symbols: vec!["BTCUSDT".to_string()],
        intervals: None,
        granularity: Granularity::Daily,
        dates: (1..=days).map(|d| format!("2024-01-{d:02}")).collect(),
        output_dir: output_dir.to_path_buf(),
        parallelism: 1,
    };
    plan(&request, base_url)
}

/// Serve every archive of the plan; days in `missing` answer with an XML
/// error payload instead.
async fn serve_plan(server: &MockServer, plan: &[ResourceDescriptor], missing: &HashSet<usize>) {
    let base = server.base_url();
    for (index, desc) in plan.iter().enumerate() {
        let path = desc
            .url
            .strip_prefix(base.as_str())
            .expect("descriptor URL not under mock server")
            .to_string();
        if missing.contains(&index) {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(path.clone());
                    then.status(404)
                        .header("content-type", "application/xml")
                        .body("<Error/>");
                })
                .await;
        } else {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(path.clone());
                    then.status(200).body(PAYLOAD);
                })
                .await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path(format!("{path}.CHECKSUM"));
                    then.status(200).body(sha256_hex(PAYLOAD));
                })
                .await;
        }
    }
}

async fn run_pool(parallelism: usize, days: usize, missing: HashSet<usize>) {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    let planned = descriptors(&server.base_url(), output.path(), days);
    serve_plan(&server, &planned, &missing).await;

    let total = planned.len();
    let (events, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let queue = Arc::new(DownloadQueue::new(planned.clone()));
    let aggregator = Arc::new(ResultAggregator::new(total, events));
    let worker = Arc::new(DownloadWorker::new(
        reqwest::Client::new(),
        output.path().to_path_buf(),
    ));

    let scheduler = ConcurrencyScheduler::new(parallelism, ShutdownCoordinator::shared());
    scheduler
        .run(queue.clone(), worker, Arc::clone(&aggregator))
        .await;

    // exactly one outcome per descriptor, no duplicates, no omissions
    assert!(queue.is_empty());
    let counters = aggregator.counters();
    assert_eq!(counters.completed(), total);
    assert_eq!(counters.no_data, missing.len());
    assert_eq!(counters.success, total - missing.len());
    assert_eq!(counters.failed, 0);

    let mut seen = HashSet::new();
    while let Ok(event) = rx.try_recv() {
        assert!(seen.insert(event.file_name.clone()), "duplicate outcome");
        assert_eq!(event.total, total);
    }
    assert_eq!(seen.len(), total);

    // verified files are on disk, no temp siblings remain
    for (index, desc) in planned.iter().enumerate() {
        assert_eq!(
            output.path().join(&desc.file_name).exists(),
            !missing.contains(&index)
        );
        assert!(!output.path().join(desc.temp_file_name()).exists());
    }
}

#[tokio::test]
async fn test_sequential_pool() {
    run_pool(1, 6, HashSet::from([2])).await;
}

#[tokio::test]
async fn test_bounded_pool() {
    run_pool(3, 10, HashSet::from([0, 7])).await;
}

#[tokio::test]
async fn test_pool_wider_than_queue() {
    run_pool(16, 4, HashSet::new()).await;
}

#[tokio::test]
async fn test_shutdown_stops_dequeuing() {
    let output = tempfile::tempdir().unwrap();
    let planned = descriptors("http://127.0.0.1:9", output.path(), 5);

    let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
    let queue = Arc::new(DownloadQueue::new(planned));
    let aggregator = Arc::new(ResultAggregator::new(5, events));
    let worker = Arc::new(DownloadWorker::new(
        reqwest::Client::new(),
        output.path().to_path_buf(),
    ));

    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let scheduler = ConcurrencyScheduler::new(2, shutdown);
    scheduler
        .run(queue.clone(), worker, Arc::clone(&aggregator))
        .await;

    // nothing was claimed after the shutdown request
    assert_eq!(queue.len(), 5);
    assert_eq!(aggregator.counters().completed(), 0);
}
