//! Main entry point for the binance-vision-downloader CLI.

use binance_vision_downloader::cli::Cli;
use binance_vision_downloader::downloader::DownloadEngine;
use binance_vision_downloader::plan::DownloadRequest;
use binance_vision_downloader::shutdown::ShutdownCoordinator;
use binance_vision_downloader::DownloadSummary;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Exit code when zero files were downloaded successfully.
const EXIT_NOTHING_DOWNLOADED: i32 = 1;
/// Exit code for parameter validation failures.
const EXIT_BAD_PARAMS: i32 = 2;
/// Exit code for unexpected errors.
const EXIT_UNEXPECTED: i32 = 255;

/// Initialize tracing subscriber with optional JSON formatting.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("binance_vision_downloader=warn"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn print_header(request: &DownloadRequest, total: usize) {
    let mut line = format!(
        "Saving to '{}'\nDownloading '{}' {} data for {} symbol(s)",
        request.output_dir.display(),
        request.data_type,
        request.granularity,
        request.symbols.len(),
    );
    if let Some(intervals) = &request.intervals {
        line.push_str(&format!(" and {} interval(s)", intervals.len()));
    }
    println!("{line}\nTotal number of files to load: {total}");
}

fn print_summary(summary: &DownloadSummary) {
    let mut line = format!(
        "\nDownloaded: {}/{} files",
        summary.success, summary.total
    );
    if summary.no_data > 0 {
        line.push_str(&format!("; not found: {}/{} files", summary.no_data, summary.total));
    }
    if summary.failed > 0 {
        line.push_str(&format!("; failed: {}/{} files", summary.failed, summary.total));
    }
    println!("{line}");
}

async fn run(request: DownloadRequest) -> anyhow::Result<DownloadSummary> {
    let total = request.symbols.len()
        * request.intervals.as_ref().map_or(1, Vec::len)
        * request.dates.len();
    print_header(&request, total);

    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received - finishing in-flight downloads...");
                shutdown.request_shutdown();
            }
        }
    });

    let (events, mut rx) =
        tokio::sync::mpsc::unbounded_channel::<binance_vision_downloader::ProgressEvent>();
    let renderer = tokio::spawn(async move {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let width = total.to_string().len();
        while let Some(event) = rx.recv().await {
            let line = match event.outcome.reason() {
                Some(reason) => format!(
                    "[{:>width$}/{}] {} ({})",
                    event.completed, event.total, event.file_name, reason
                ),
                None => format!(
                    "[{:>width$}/{}] {}",
                    event.completed, event.total, event.file_name
                ),
            };
            bar.println(line);
            bar.inc(1);
        }
        bar.finish_and_clear();
    });

    let engine = DownloadEngine::new(shutdown)?;
    let summary = engine.run(&request, events).await;

    // The engine dropped its sender; the renderer drains and exits.
    renderer.await?;
    print_summary(&summary);
    Ok(summary)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let request = match cli.into_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_BAD_PARAMS);
        }
    };

    match run(request).await {
        Ok(summary) => {
            if summary.is_failure() {
                std::process::exit(EXIT_NOTHING_DOWNLOADED);
            }
        }
        Err(e) => {
            error!("Download run failed: {e:#}");
            std::process::exit(EXIT_UNEXPECTED);
        }
    }
}
