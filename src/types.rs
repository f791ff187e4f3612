//! Core market data types

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Single OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ascending, duplicate-free sequence of bars
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    bars: Vec<Bar>,
}

impl TimeSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(ForecastError::InvalidSeries(format!(
                "timestamp at row {} ({}) does not follow {}",
                pos + 1,
                bars[pos + 1].timestamp,
                bars[pos].timestamp
            )));
        }
        Ok(Self { bars })
    }

    /// Build a series from closes only, one bar per day starting at `start`
    ///
    /// Open, high and low mirror the close; volume is constant.
    pub fn from_closes(start: DateTime<Utc>, closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000_000.0,
            })
            .collect();
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Keep the bars whose timestamp satisfies `keep`; order is preserved
    pub fn filter(&self, keep: impl Fn(DateTime<Utc>) -> bool) -> Self {
        Self {
            bars: self
                .bars
                .iter()
                .filter(|b| keep(b.timestamp))
                .copied()
                .collect(),
        }
    }
}

/// Close history in the shape the charting frontend expects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalSeries {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl From<&TimeSeries> for HistoricalSeries {
    fn from(series: &TimeSeries) -> Self {
        Self {
            dates: series
                .bars()
                .iter()
                .map(|b| b.timestamp.format("%Y-%m-%d").to_string())
                .collect(),
            prices: series.closes(),
        }
    }
}

/// Convert a full-precision figure into a 2dp monetary amount
pub fn to_money(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| ForecastError::Numerical(format!("{} is not representable", value)))
}
