//! Command-line argument parsing and validation.
//!
//! Everything here runs before the engine: flags are parsed with clap,
//! cross-checked against the [`catalog`](crate::catalog), and frozen into a
//! [`DownloadRequest`] the engine accepts directly. Parameter failures never
//! reach the network.

use crate::catalog::{self, Product};
use crate::dates::{self, DateError, Granularity};
use crate::plan::DownloadRequest;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A flag value failed validation
    #[error("{0}")]
    InvalidArgument(String),

    /// Date token or range failure
    #[error(transparent)]
    DateError(#[from] DateError),

    /// Output directory could not be prepared
    #[error("could not use output directory '{path}': {detail}")]
    OutputDir {
        /// The requested path
        path: String,
        /// Underlying failure
        detail: String,
    },
}

fn parse_parallel(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| "--parallel (-P) must be a number (1 or greater)".to_string())?;
    if value < 1 {
        return Err("--parallel (-P) must be a number (1 or greater)".to_string());
    }
    Ok(value)
}

/// Bulk downloader for historical market-data archives from Binance Vision
#[derive(Parser, Debug)]
#[command(name = "binance-vision-downloader", version, about)]
pub struct Cli {
    /// Date in 'YYYY-MM' (monthly data) or 'YYYY-MM-DD' (daily data) format;
    /// provide two dates of the same format for an inclusive range
    #[arg(short, long, num_args = 1..=2, required = true)]
    pub date: Vec<String>,

    /// Product: one of 'spot', 'usd-m', 'coin-m', 'option'
    #[arg(short, long)]
    pub product: String,

    /// Data type (e.g., 'klines')
    #[arg(short = 't', long = "data-type")]
    pub data_type: String,

    /// One or more symbols (e.g., 'btcusdt')
    #[arg(short, long, num_args = 1..)]
    pub symbols: Vec<String>,

    /// One or more intervals; required for interval-bearing data types
    #[arg(short, long, num_args = 1..)]
    pub intervals: Vec<String>,

    /// Directory to save the data to
    #[arg(short, long, default_value = ".")]
    pub output_path: PathBuf,

    /// Number of files to download at a time
    #[arg(short = 'P', long = "parallel", default_value_t = 5, value_parser = parse_parallel)]
    pub parallel: usize,

    /// Skip data-type and interval validation. Only use this if the
    /// upstream catalog has changed
    #[arg(long = "no-validate-params", action = clap::ArgAction::SetFalse)]
    pub validate_params: bool,
}

impl Cli {
    /// Validate all flags and freeze them into a [`DownloadRequest`].
    pub fn into_request(self) -> Result<DownloadRequest, CliError> {
        let (granularity, dates) = self.validated_dates()?;

        let product = Product::from_str(&self.product).map_err(|_| {
            CliError::InvalidArgument(format!(
                "--product (-p) should be one of: {}",
                catalog::quoted_list(&Product::TOKENS)
            ))
        })?;

        if self.validate_params {
            self.validate_data_type(product, granularity)?;
        }

        if self.symbols.is_empty() {
            return Err(CliError::InvalidArgument(
                "at least one symbol must be provided (e.g., 'btcusdt')".to_string(),
            ));
        }
        let symbols: Vec<String> = self.symbols.iter().map(|s| s.to_uppercase()).collect();

        let intervals = self.validated_intervals()?;
        let output_dir = prepare_output_dir(&self.output_path)?;

        Ok(DownloadRequest {
            product,
            data_type: self.data_type,
            symbols,
            intervals,
            granularity,
            dates,
            output_dir,
            parallelism: self.parallel,
        })
    }

    /// Infer the granularity from the first token, check both tokens share
    /// a format, and expand the range.
    fn validated_dates(&self) -> Result<(Granularity, Vec<String>), CliError> {
        if self.date.len() > 2 {
            return Err(CliError::InvalidArgument(format!(
                "only one or two date strings expected, received: {}",
                self.date.join(", ")
            )));
        }
        let start = &self.date[0];
        let granularity = Granularity::of_token(start).ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "incorrect start date: '{start}'. Accepted formats: monthly (YYYY-MM), daily (YYYY-MM-DD)"
            ))
        })?;

        let end = self.date.get(1);
        if let Some(end) = end {
            if Granularity::of_token(end) != Some(granularity) {
                return Err(CliError::InvalidArgument(format!(
                    "incorrect end date: '{end}'. Both start and end date should either be in monthly (YYYY-MM) or daily (YYYY-MM-DD) format"
                )));
            }
        }

        let dates = dates::expand(granularity, start, end.map(String::as_str))?;
        Ok((granularity, dates))
    }

    fn validate_data_type(
        &self,
        product: Product,
        granularity: Granularity,
    ) -> Result<(), CliError> {
        if product == Product::Options && granularity != Granularity::Daily {
            return Err(CliError::InvalidArgument(
                "only daily data is available for 'option'".to_string(),
            ));
        }
        let accepted = catalog::data_types_for(product, granularity);
        if !accepted.contains(&self.data_type.as_str()) {
            return Err(CliError::InvalidArgument(format!(
                "--data-type (-t) for {} '{}' data should be one of: {}",
                granularity,
                product,
                catalog::quoted_list(accepted)
            )));
        }
        Ok(())
    }

    /// Intervals are required for interval-bearing data types and ignored
    /// for the rest.
    fn validated_intervals(&self) -> Result<Option<Vec<String>>, CliError> {
        if self.validate_params && !catalog::has_intervals(&self.data_type) {
            return Ok(None);
        }
        if self.intervals.is_empty() {
            if !self.validate_params {
                return Ok(None);
            }
            return Err(CliError::InvalidArgument(format!(
                "at least one 'interval' must be provided for '{}' data",
                self.data_type
            )));
        }
        if self.validate_params {
            let incorrect: Vec<&str> = self
                .intervals
                .iter()
                .map(String::as_str)
                .filter(|i| !catalog::INTERVALS.contains(i))
                .collect();
            if !incorrect.is_empty() {
                return Err(CliError::InvalidArgument(format!(
                    "incorrect intervals provided: {}. Accepted intervals: {}",
                    catalog::quoted_list(&incorrect),
                    catalog::quoted_list(catalog::INTERVALS)
                )));
            }
        }
        Ok(Some(self.intervals.clone()))
    }
}

/// Resolve the output directory, creating it when missing.
fn prepare_output_dir(path: &PathBuf) -> Result<PathBuf, CliError> {
    if !path.exists() {
        warn!("output directory does not exist, creating {:?}", path);
        std::fs::create_dir_all(path).map_err(|e| CliError::OutputDir {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
    } else if !path.is_dir() {
        return Err(CliError::OutputDir {
            path: path.display().to_string(),
            detail: "not a directory".to_string(),
        });
    }
    Ok(path.clone())
}
