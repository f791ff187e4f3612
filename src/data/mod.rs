//! Market data sources
//!
//! - [`YahooClient`]: daily bars from the Yahoo Finance chart API
//! - [`StaticSource`]: in-memory series, for tests and offline runs
//!
//! Every source returns an ascending, duplicate-free [`TimeSeries`] or
//! `DataUnavailable` when the symbol yields nothing.

mod memory;
mod yahoo;

#[cfg(test)]
mod tests;

pub use memory::StaticSource;
pub use yahoo::YahooClient;

use crate::error::{ForecastError, Result};
use crate::types::TimeSeries;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

/// Period names accepted by the chart API, with their span in days
///
/// `ytd` and `max` are resolved against the data instead.
pub const PERIODS: &[(&str, i64)] = &[
    ("1d", 1),
    ("5d", 5),
    ("1mo", 30),
    ("3mo", 91),
    ("6mo", 182),
    ("1y", 365),
    ("2y", 730),
    ("5y", 1826),
    ("10y", 3652),
    ("ytd", 0),
    ("max", 0),
];

/// How much history to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookback {
    /// Relative period ending now, e.g. `1y`
    Period(String),
    /// Calendar range, start inclusive, end exclusive
    Range { start: NaiveDate, end: NaiveDate },
}

impl Lookback {
    pub fn period(name: &str) -> Result<Self> {
        let key = name.trim().to_ascii_lowercase();
        if PERIODS.iter().any(|(p, _)| *p == key) {
            Ok(Lookback::Period(key))
        } else {
            Err(ForecastError::InvalidLookback(format!(
                "unknown period '{}'",
                name.trim()
            )))
        }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(ForecastError::InvalidLookback(format!(
                "start {} is not before end {}",
                start, end
            )));
        }
        Ok(Lookback::Range { start, end })
    }

    /// Restrict `series` to this lookback, anchored at its last bar
    pub fn clip(&self, series: &TimeSeries) -> TimeSeries {
        let Some(last) = series.bars().last().map(|b| b.timestamp) else {
            return series.clone();
        };

        match self {
            Lookback::Period(name) if name == "max" => series.clone(),
            Lookback::Period(name) if name == "ytd" => {
                let year_start = Utc
                    .with_ymd_and_hms(last.year(), 1, 1, 0, 0, 0)
                    .single()
                    .unwrap_or(last);
                series.filter(|ts| ts >= year_start)
            }
            Lookback::Period(name) => {
                let days = PERIODS
                    .iter()
                    .find(|(p, _)| p == name)
                    .map(|(_, d)| *d)
                    .unwrap_or(0);
                let cutoff = last - Duration::days(days);
                series.filter(|ts| ts > cutoff)
            }
            Lookback::Range { start, end } => {
                let (start, end) = (midnight(*start), midnight(*end));
                series.filter(|ts| ts >= start && ts < end)
            }
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Period(name) => f.write_str(name),
            Lookback::Range { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Provider of historical daily bars
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch bars for `symbol` over `lookback`
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<TimeSeries>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}
