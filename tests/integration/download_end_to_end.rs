//! End-to-end engine runs against a mock archive host.

use binance_vision_downloader::catalog::Product;
use binance_vision_downloader::dates::Granularity;
use binance_vision_downloader::downloader::DownloadEngine;
use binance_vision_downloader::plan::DownloadRequest;
use binance_vision_downloader::shutdown::ShutdownCoordinator;
use httpmock::prelude::*;
use sha2::{Digest, Sha256};
use std::path::Path;

const PAYLOAD: &[u8] = b"end to end archive bytes";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn request(output_dir: &Path, dates: Vec<String>) -> DownloadRequest {
    DownloadRequest {
        product: Product::UsdMargined,
        data_type: "klines".to_string(),
        symbols: vec!["BTCUSDT".to_string()],
        intervals: Some(vec!["1h".to_string()]),
        granularity: Granularity::Daily,
        dates,
        output_dir: output_dir.to_path_buf(),
        parallelism: 4,
    }
}

#[tokio::test]
async fn test_mixed_run_summary_and_events() {
    let server = MockServer::start_async().await;
    let output = tempfile::tempdir().unwrap();

    // day 1: verified download
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-03-01.zip");
            then.status(200).body(PAYLOAD);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-03-01.zip.CHECKSUM");
            then.status(200).body(sha256_hex(PAYLOAD));
        })
        .await;

    // day 2: no data
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-03-02.zip");
            then.status(404)
                .header("content-type", "application/xml")
                .body("<Error><Code>NoSuchKey</Code></Error>");
        })
        .await;

    // day 3: corrupted payload
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-03-03.zip");
            then.status(200).body("corrupted bytes");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/futures/um/daily/klines/BTCUSDT/1h/BTCUSDT-1h-2024-03-03.zip.CHECKSUM");
            then.status(200).body(sha256_hex(PAYLOAD));
        })
        .await;

    let request = request(
        output.path(),
        vec![
            "2024-03-01".to_string(),
            "2024-03-02".to_string(),
            "2024-03-03".to_string(),
        ],
    );

    let (events, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let engine =
        DownloadEngine::with_base_url(server.base_url(), ShutdownCoordinator::shared()).unwrap();
    let summary = engine.run(&request, events).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.no_data, 1);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_failure());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    // completed counts are monotone even with concurrent workers
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.completed, i + 1);
        assert_eq!(event.total, 3);
    }

    assert!(output.path().join("BTCUSDT-1h-2024-03-01.zip").exists());
    assert!(!output.path().join("BTCUSDT-1h-2024-03-02.zip").exists());
    assert!(!output.path().join("BTCUSDT-1h-2024-03-03.zip").exists());
    assert!(!output
        .path()
        .join("BTCUSDT-1h-2024-03-03_UNVERIFIED.zip")
        .exists());
}

#[tokio::test]
async fn test_all_failures_is_terminal_failure() {
    let output = tempfile::tempdir().unwrap();

    // nothing listens on the discard port, every fetch fails
    let request = request(output.path(), vec!["2024-03-01".to_string()]);
    let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = DownloadEngine::with_base_url(
        "http://127.0.0.1:9".to_string(),
        ShutdownCoordinator::shared(),
    )
    .unwrap();

    let summary = engine.run(&request, events).await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.success, 0);
    assert_eq!(summary.failed, 1);
    assert!(summary.is_failure());
}
