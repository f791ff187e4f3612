//! Yahoo Finance chart API client
//!
//! Fetches daily OHLCV bars from `/v8/finance/chart/{symbol}`.

use super::{midnight, DataSource, Lookback};
use crate::config::DataConfig;
use crate::error::{ForecastError, Result};
use crate::types::{Bar, TimeSeries};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Chart API client
#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl Quote {
    fn field(values: &[Option<f64>], i: usize) -> Option<f64> {
        values.get(i).copied().flatten().filter(|v| v.is_finite())
    }

    fn bar(&self, i: usize, timestamp: i64) -> Option<Bar> {
        Some(Bar {
            timestamp: DateTime::from_timestamp(timestamp, 0)?,
            open: Self::field(&self.open, i)?,
            high: Self::field(&self.high, i)?,
            low: Self::field(&self.low, i)?,
            close: Self::field(&self.close, i)?,
            volume: Self::field(&self.volume, i)?,
        })
    }
}

impl YahooClient {
    pub fn new(config: &DataConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    fn query(lookback: &Lookback) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("interval", "1d".to_string()),
            ("includePrePost", "false".to_string()),
        ];
        match lookback {
            Lookback::Period(name) => params.push(("range", name.clone())),
            Lookback::Range { start, end } => {
                params.push(("period1", midnight(*start).timestamp().to_string()));
                params.push(("period2", midnight(*end).timestamp().to_string()));
            }
        }
        params
    }
}

/// Turn a chart response body into a clean series
///
/// Rows with any missing or non-finite field are dropped, the rest sorted
/// and deduplicated by timestamp.
pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<TimeSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| ForecastError::unavailable(symbol, format!("malformed chart response: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        let reason = err.description.unwrap_or(err.code);
        return Err(ForecastError::unavailable(symbol, reason));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ForecastError::unavailable(symbol, "empty chart result"))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars: Vec<Bar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| quote.bar(i, ts))
        .collect();

    let dropped = result.timestamp.len() - bars.len();
    if dropped > 0 {
        warn!(symbol, dropped, "Dropped incomplete chart rows");
    }

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    if bars.is_empty() {
        return Err(ForecastError::unavailable(symbol, "no price rows returned"));
    }
    TimeSeries::new(bars)
}

#[async_trait]
impl DataSource for YahooClient {
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<TimeSeries> {
        let url = self.chart_url(symbol);
        debug!(symbol, %lookback, "Fetching chart");

        let resp = self
            .http
            .get(&url)
            .query(&Self::query(&lookback))
            .send()
            .await?;

        // unknown symbols come back as 404 with a chart error body
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status_ref()?;
        }
        let body = resp.text().await?;

        let series = parse_chart(symbol, &body)?;
        debug!(symbol, bars = series.len(), "Fetched chart");
        Ok(series)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
