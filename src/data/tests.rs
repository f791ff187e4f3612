//! Tests for data sources

use super::yahoo::parse_chart;
use super::*;
use chrono::{TimeZone, Utc};

fn daily(n: usize) -> TimeSeries {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let closes: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
    TimeSeries::from_closes(start, &closes)
}

const CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": {"symbol": "AAPL", "currency": "USD"},
      "timestamp": [1704205800, 1704119400, 1704292200, 1704378600, 1704205800],
      "indicators": {
        "quote": [{
          "open":   [186.0, 185.0, 184.2, null,  186.0],
          "high":   [188.4, 186.5, 185.9, 183.0, 188.4],
          "low":    [183.9, 184.1, 183.4, 180.9, 183.9],
          "close":  [185.6, 185.2, 184.3, 181.9, 185.6],
          "volume": [82488700, 58414500, 58414500, 71983600, 82488700]
        }]
      }
    }],
    "error": null
  }
}"#;

#[test]
fn test_parse_chart_cleans_rows() {
    let series = parse_chart("AAPL", CHART).unwrap();

    // null open dropped, duplicate timestamp collapsed, order restored
    assert_eq!(series.len(), 3);
    let ts: Vec<i64> = series.timestamps().iter().map(|t| t.timestamp()).collect();
    assert_eq!(ts, vec![1704119400, 1704205800, 1704292200]);
    assert_eq!(series.closes(), vec![185.2, 185.6, 184.3]);
    assert_eq!(series.bars()[0].volume, 58414500.0);
}

#[test]
fn test_parse_chart_error_body() {
    let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
    let err = parse_chart("ZZZZ", body).unwrap_err();
    assert_eq!(err.kind(), "DataUnavailableError");
    assert!(err.to_string().contains("delisted"));
    assert!(err.to_string().contains("ZZZZ"));
}

#[test]
fn test_parse_chart_without_rows() {
    let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
    let err = parse_chart("AAPL", body).unwrap_err();
    assert_eq!(err.kind(), "DataUnavailableError");
}

#[test]
fn test_parse_chart_malformed() {
    let err = parse_chart("AAPL", "<html>rate limited</html>").unwrap_err();
    assert_eq!(err.kind(), "DataUnavailableError");
}

#[test]
fn test_lookback_period_validation() {
    assert_eq!(Lookback::period(" 1Y ").unwrap(), Lookback::Period("1y".into()));
    assert_eq!(Lookback::period("max").unwrap().to_string(), "max");
    assert_eq!(Lookback::period("7w").unwrap_err().kind(), "InvalidLookbackError");
}

#[test]
fn test_lookback_range_validation() {
    let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let b = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    assert!(Lookback::range(a, b).is_ok());
    assert_eq!(Lookback::range(b, a).unwrap_err().kind(), "InvalidLookbackError");
    assert_eq!(Lookback::range(a, a).unwrap_err().kind(), "InvalidLookbackError");
}

#[test]
fn test_clip_period_anchors_on_last_bar() {
    let series = daily(400);
    assert_eq!(Lookback::period("1y").unwrap().clip(&series).len(), 365);
    assert_eq!(Lookback::period("5d").unwrap().clip(&series).len(), 5);
    assert_eq!(Lookback::period("max").unwrap().clip(&series).len(), 400);
}

#[test]
fn test_clip_ytd() {
    // 400 days from 2023-01-01 ends on 2024-02-04
    let clipped = Lookback::period("ytd").unwrap().clip(&daily(400));
    assert_eq!(clipped.len(), 35);
}

#[test]
fn test_clip_range_is_half_open() {
    let lookback = Lookback::range(
        NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
        NaiveDate::from_ymd_opt(2023, 1, 8).unwrap(),
    )
    .unwrap();
    let clipped = lookback.clip(&daily(30));
    assert_eq!(clipped.len(), 5);
    assert_eq!(clipped.closes()[0], 12.0);
}

#[tokio::test]
async fn test_static_source_lookup() {
    let source = StaticSource::new().with_series("aapl", daily(50));
    assert_eq!(source.symbols(), vec!["AAPL"]);

    let series = source.fetch("AAPL", Lookback::period("max").unwrap()).await.unwrap();
    assert_eq!(series.len(), 50);

    let err = source.fetch("MSFT", Lookback::period("1y").unwrap()).await.unwrap_err();
    assert_eq!(err.kind(), "DataUnavailableError");
}

#[tokio::test]
async fn test_static_source_empty_window() {
    let source = StaticSource::new().with_series("AAPL", daily(10));
    let lookback = Lookback::range(
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
    )
    .unwrap();
    let err = source.fetch("aapl", lookback).await.unwrap_err();
    assert_eq!(err.kind(), "DataUnavailableError");
}
