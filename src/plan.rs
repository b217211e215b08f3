//! Request planning: expanding a validated download request into the ordered
//! list of remote resources to fetch.
//!
//! URL pattern:
//! `{base}/{productSegment}/{daily|monthly}/{dataType}/{SYMBOL}[/{interval}]/{SYMBOL}-{label}-{date}.zip`
//! where `label` is the interval for interval-bearing data types and the
//! data-type name otherwise.

use crate::catalog::Product;
use crate::dates::Granularity;
use std::path::PathBuf;

/// Default base URL of the Binance Vision dataset host.
pub const VISION_BASE_URL: &str = "https://data.binance.vision/data";

/// Validated download request handed to the engine.
///
/// Every field is already range/enum-checked by the CLI layer; the engine
/// and tests accept this value directly.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Product family
    pub product: Product,
    /// Data type (e.g., "klines")
    pub data_type: String,
    /// Upper-cased symbols, at least one
    pub symbols: Vec<String>,
    /// Intervals; present iff the data type is interval-bearing
    pub intervals: Option<Vec<String>>,
    /// Daily or monthly archives
    pub granularity: Granularity,
    /// Expanded, ordered date tokens
    pub dates: Vec<String>,
    /// Existing, writable output directory
    pub output_dir: PathBuf,
    /// Number of concurrent downloads, at least 1
    pub parallelism: usize,
}

/// One remote archive to fetch: URLs plus the expected local filename.
/// Created once at plan time, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Archive payload URL
    pub url: String,
    /// Companion checksum URL (`url` + ".CHECKSUM")
    pub checksum_url: String,
    /// Local filename, `{SYMBOL}-{label}-{date}.zip`
    pub file_name: String,
    /// Upper-cased symbol
    pub symbol: String,
    /// Interval for interval-bearing data types, else the data-type name
    pub label: String,
}

impl ResourceDescriptor {
    /// Name of the in-flight temporary file, sibling to the final one.
    /// `BTCUSDT-1h-2024-01-01.zip` -> `BTCUSDT-1h-2024-01-01_UNVERIFIED.zip`.
    pub fn temp_file_name(&self) -> String {
        match self.file_name.strip_suffix(".zip") {
            Some(stem) => format!("{stem}_UNVERIFIED.zip"),
            None => format!("{}_UNVERIFIED", self.file_name),
        }
    }
}

/// Build the ordered download plan for a request.
///
/// Iteration is symbol-major, then interval (single pass when the data type
/// carries none), then date, which fixes the queue order for deterministic
/// scheduling. Output length is `|symbols| * max(1, |intervals|) * |dates|`.
pub fn plan(request: &DownloadRequest, base_url: &str) -> Vec<ResourceDescriptor> {
    let product_segment = request.product.path_segment();
    let granularity_segment = request.granularity.path_segment();
    let data_type = request.data_type.as_str();

    // A data type without intervals still gets one pass per symbol.
    let interval_passes: Vec<Option<&str>> = match &request.intervals {
        Some(intervals) => intervals.iter().map(|i| Some(i.as_str())).collect(),
        None => vec![None],
    };

    let mut descriptors =
        Vec::with_capacity(request.symbols.len() * interval_passes.len() * request.dates.len());

    for symbol in &request.symbols {
        let symbol = symbol.to_uppercase();
        for interval in &interval_passes {
            for date in &request.dates {
                let label = interval.unwrap_or(data_type);
                let file_name = format!("{symbol}-{label}-{date}.zip");
                let mut url = format!(
                    "{base_url}/{product_segment}/{granularity_segment}/{data_type}/{symbol}"
                );
                if let Some(interval) = interval {
                    url.push('/');
                    url.push_str(interval);
                }
                url.push('/');
                url.push_str(&file_name);

                descriptors.push(ResourceDescriptor {
                    checksum_url: format!("{url}.CHECKSUM"),
                    url,
                    file_name,
                    symbol: symbol.clone(),
                    label: label.to_string(),
                });
            }
        }
    }

    descriptors
}
