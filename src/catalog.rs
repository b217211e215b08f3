//! Catalog of products, data types, and intervals published by the dataset
//! host. Used by CLI validation and by the planner to decide whether a data
//! type carries an interval path segment.

use crate::dates::Granularity;
use std::str::FromStr;

/// Product family on the dataset host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    /// Spot market data
    Spot,
    /// USDT-margined futures
    UsdMargined,
    /// COIN-margined futures
    CoinMargined,
    /// Options data
    Options,
}

impl Product {
    /// All accepted CLI tokens, in display order.
    pub const TOKENS: [&'static str; 4] = ["spot", "usd-m", "coin-m", "option"];

    /// URL path segment for this product. Futures products map to nested
    /// `futures/um` / `futures/cm` segments; the rest map to themselves.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Product::Spot => "spot",
            Product::UsdMargined => "futures/um",
            Product::CoinMargined => "futures/cm",
            Product::Options => "option",
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Product::Spot => "spot",
            Product::UsdMargined => "usd-m",
            Product::CoinMargined => "coin-m",
            Product::Options => "option",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(Product::Spot),
            "usd-m" => Ok(Product::UsdMargined),
            "coin-m" => Ok(Product::CoinMargined),
            "option" => Ok(Product::Options),
            _ => Err(format!("invalid product: {s}")),
        }
    }
}

/// Data types available for spot archives.
pub const SPOT_DATA_TYPES: &[&str] = &["klines", "aggTrades", "trades"];

/// Data types available for daily futures archives.
pub const FUTURES_DAILY_DATA_TYPES: &[&str] = &[
    "aggTrades",
    "bookDepth",
    "bookTicker",
    "indexPriceKlines",
    "klines",
    "liquidationSnapshot",
    "markPriceKlines",
    "metrics",
    "premiumIndexKlines",
    "trades",
];

/// Data types available for monthly futures archives.
pub const FUTURES_MONTHLY_DATA_TYPES: &[&str] = &[
    "aggTrades",
    "bookTicker",
    "fundingRate",
    "indexPriceKlines",
    "klines",
    "markPriceKlines",
    "premiumIndexKlines",
    "trades",
];

/// Data types available for option archives (daily only).
pub const OPTION_DATA_TYPES: &[&str] = &["BVOLIndex", "EOHSummary"];

/// Data types whose archives are further partitioned by interval.
pub const INTERVAL_DATA_TYPES: &[&str] = &[
    "klines",
    "indexPriceKlines",
    "markPriceKlines",
    "premiumIndexKlines",
];

/// Accepted interval tokens.
pub const INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1mo",
];

/// Whether archives of this data type carry an interval path segment.
pub fn has_intervals(data_type: &str) -> bool {
    INTERVAL_DATA_TYPES.contains(&data_type)
}

/// Valid data types for a product at the given granularity.
pub fn data_types_for(product: Product, granularity: Granularity) -> &'static [&'static str] {
    match product {
        Product::Spot => SPOT_DATA_TYPES,
        Product::Options => OPTION_DATA_TYPES,
        Product::UsdMargined | Product::CoinMargined => match granularity {
            Granularity::Daily => FUTURES_DAILY_DATA_TYPES,
            Granularity::Monthly => FUTURES_MONTHLY_DATA_TYPES,
        },
    }
}

/// Render a list of tokens as `'a', 'b', 'c'` for error messages.
pub fn quoted_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
