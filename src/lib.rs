//! # Binance Vision Downloader
//!
//! A bulk downloader for historical market-data archives published on the
//! Binance Vision dataset host. Archives are organized by product, data
//! type, symbol, interval, and date; this crate expands a validated request
//! into the full list of archive URLs, downloads them with bounded
//! concurrency, verifies each payload against its published SHA-256
//! `.CHECKSUM` companion while streaming, and places verified files
//! atomically into the output directory.
//!
//! ## Features
//!
//! - **Date range expansion**: daily (`YYYY-MM-DD`) and monthly (`YYYY-MM`)
//!   archive slices with calendar-correct UTC stepping
//! - **Streaming verification**: payloads are hashed chunk-by-chunk as they
//!   are written, never buffered whole in memory
//! - **Atomic placement**: files land under an `_UNVERIFIED` name and are
//!   renamed only after the checksum matches
//! - **Bounded concurrency**: a fixed-size FIFO worker pool; per-file
//!   failures are tallied, never abort the run
//!
//! ## Architecture
//!
//! - [`dates`] - Date token validation and range expansion
//! - [`catalog`] - Products, data types, and intervals of the dataset host
//! - [`plan`] - Request planning into resource descriptors
//! - [`downloader`] - Queue, worker pool, scheduler, and result accounting
//! - [`cli`] - Argument parsing and validation
//! - [`shutdown`] - Graceful shutdown coordination

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Products, data types, and intervals published by the dataset host
pub mod catalog;

/// CLI argument parsing and validation
pub mod cli;

/// Date token validation and range expansion
pub mod dates;

/// Download engine: queue, workers, scheduler, result accounting
pub mod downloader;

/// Request planning
pub mod plan;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

pub use downloader::{DownloadEngine, DownloadSummary, Outcome, ProgressEvent};
pub use plan::{DownloadRequest, ResourceDescriptor};
