//! In-memory data source

use super::{DataSource, Lookback};
use crate::error::{ForecastError, Result};
use crate::types::TimeSeries;
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves preloaded series keyed by upper-case symbol
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    series: HashMap<String, TimeSeries>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, series: TimeSeries) -> Self {
        self.insert(symbol, series);
        self
    }

    pub fn insert(&mut self, symbol: &str, series: TimeSeries) {
        self.series.insert(symbol.trim().to_ascii_uppercase(), series);
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.series.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<TimeSeries> {
        let key = symbol.trim().to_ascii_uppercase();
        let series = self
            .series
            .get(&key)
            .ok_or_else(|| ForecastError::unavailable(&key, "unknown symbol"))?;

        let clipped = lookback.clip(series);
        if clipped.is_empty() {
            return Err(ForecastError::unavailable(
                &key,
                format!("no bars within {}", lookback),
            ));
        }
        Ok(clipped)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
