//! Date token validation and range expansion.
//!
//! Binance Vision partitions archives either by day (`YYYY-MM-DD`) or by
//! month (`YYYY-MM`). This module validates date tokens against those two
//! formats and expands an inclusive `(start, end)` range into the ordered
//! list of tokens between them, stepping by one calendar day or one calendar
//! month. All arithmetic is plain UTC date-component math via [`NaiveDate`];
//! no local-time conversions are involved anywhere.

use chrono::{Datelike, Months, NaiveDate};

/// Date partitioning mode of the requested archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One archive per calendar day (`YYYY-MM-DD` tokens).
    Daily,
    /// One archive per calendar month (`YYYY-MM` tokens).
    Monthly,
}

impl Granularity {
    /// URL path segment used by the dataset host.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
        }
    }

    /// Detect the granularity of a date token, if it matches either format.
    pub fn of_token(token: &str) -> Option<Granularity> {
        if is_daily_token(token) {
            Some(Granularity::Daily)
        } else if is_monthly_token(token) {
            Some(Granularity::Monthly)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Date expansion errors
#[derive(Debug, thiserror::Error)]
pub enum DateError {
    /// Token does not match the expected format for the granularity
    #[error("invalid {expected} date token: '{token}'")]
    InvalidToken {
        /// Granularity the token was validated against
        expected: Granularity,
        /// The offending token
        token: String,
    },

    /// End date is not strictly after the start date
    #[error("end date '{end}' should be greater than start date '{start}'")]
    InvalidRange {
        /// Range start token
        start: String,
        /// Range end token
        end: String,
    },
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn in_range(s: &str, min: u32, max: u32) -> bool {
    all_digits(s) && s.parse::<u32>().map(|v| v >= min && v <= max).unwrap_or(false)
}

/// Whether a token matches `YYYY-MM` with year 2000-2099 and month 01-12.
pub fn is_monthly_token(token: &str) -> bool {
    let parts: Vec<&str> = token.split('-').collect();
    parts.len() == 2
        && parts[0].len() == 4
        && parts[0].starts_with("20")
        && all_digits(parts[0])
        && parts[1].len() == 2
        && in_range(parts[1], 1, 12)
}

/// Whether a token matches `YYYY-MM-DD`. The day is pattern-checked only
/// (01-31); calendar correctness is enforced by the range arithmetic.
pub fn is_daily_token(token: &str) -> bool {
    match token.rsplit_once('-') {
        Some((month_part, day)) => {
            is_monthly_token(month_part) && day.len() == 2 && in_range(day, 1, 31)
        }
        None => false,
    }
}

/// Parse a token into the date its archive slice starts at.
/// Monthly tokens map to the first day of the month.
fn parse_token(granularity: Granularity, token: &str) -> Result<NaiveDate, DateError> {
    let invalid = || DateError::InvalidToken {
        expected: granularity,
        token: token.to_string(),
    };

    match granularity {
        Granularity::Daily => {
            if !is_daily_token(token) {
                return Err(invalid());
            }
            // Pattern allows calendar-invalid days like 2023-02-31; those
            // only surface here, when range stepping needs real dates.
            NaiveDate::parse_from_str(token, "%Y-%m-%d").map_err(|_| invalid())
        }
        Granularity::Monthly => {
            if !is_monthly_token(token) {
                return Err(invalid());
            }
            NaiveDate::parse_from_str(&format!("{token}-01"), "%Y-%m-%d").map_err(|_| invalid())
        }
    }
}

fn format_token(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
    }
}

/// Expand a date range into the inclusive, ordered token sequence.
///
/// Without an end date the sequence is just `[start]`. With one, tokens are
/// produced from `start` to `end` stepping one calendar day or one calendar
/// month; 28/29/30/31-day months and leap years fall out of the chrono
/// arithmetic. Fails with [`DateError::InvalidRange`] when `end <= start`.
pub fn expand(
    granularity: Granularity,
    start: &str,
    end: Option<&str>,
) -> Result<Vec<String>, DateError> {
    let start_date = parse_token(granularity, start)?;

    let Some(end) = end else {
        return Ok(vec![start.to_string()]);
    };

    let end_date = parse_token(granularity, end)?;
    if end_date <= start_date {
        return Err(DateError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let mut tokens = Vec::new();
    let mut current = start_date;
    while current <= end_date {
        tokens.push(format_token(granularity, current));
        current = match granularity {
            Granularity::Daily => match current.succ_opt() {
                Some(next) => next,
                None => break,
            },
            Granularity::Monthly => match current.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            },
        };
    }

    Ok(tokens)
}
