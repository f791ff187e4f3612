//! Tests for horizon projection

use super::*;
use rust_decimal_macros::dec;

fn rising(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

#[test]
fn test_validate_horizon() {
    assert_eq!(validate_horizon(1).unwrap(), 1);
    assert_eq!(validate_horizon(0).unwrap_err().kind(), "InvalidHorizonError");
    assert_eq!(validate_horizon(-5).unwrap_err().kind(), "InvalidHorizonError");
}

#[test]
fn test_horizon_upper_bound() {
    let max = i64::from(MAX_HORIZON);
    assert_eq!(validate_horizon(max).unwrap(), MAX_HORIZON);
    assert_eq!(validate_horizon(max + 1).unwrap_err().kind(), "InvalidHorizonError");
    assert_eq!(
        validate_horizon(i64::from(u32::MAX)).unwrap_err().kind(),
        "InvalidHorizonError"
    );

    let projector = Projector::default();
    let result = projector.project(&rising(30), max, "linear").unwrap();
    assert_eq!(result.trend_series.unwrap().len(), 30 + MAX_HORIZON as usize + 1);

    let err = projector.project(&rising(30), 4_000_000_000, "linear").unwrap_err();
    assert_eq!(err.kind(), "InvalidHorizonError");
    assert!(err.to_string().contains("3650"));
}

#[test]
fn test_negative_horizon_wins_over_everything() {
    let projector = Projector::default();
    let err = projector.project(&[], -5, "foo").unwrap_err();
    assert_eq!(err.kind(), "InvalidHorizonError");

    let err = projector.project(&rising(10), -5, "linear").unwrap_err();
    assert_eq!(err.kind(), "InvalidHorizonError");
}

#[test]
fn test_unknown_model_fails_before_fit() {
    let err = Projector::default().project(&[], 5, "foo").unwrap_err();
    assert_eq!(err.kind(), "InvalidModelError");
}

#[test]
fn test_empty_series_cannot_be_projected() {
    let err = Projector::default().project(&[], 5, "linear").unwrap_err();
    assert_eq!(err.kind(), "InsufficientDataError");
}

#[test]
fn test_volatility_edge_cases() {
    assert_eq!(return_volatility(&[]), 0.0);
    assert_eq!(return_volatility(&[42.0]), 0.0);
    assert_eq!(return_volatility(&[42.0, 43.0]), 0.0);
    assert_eq!(return_volatility(&[7.0; 30]), 0.0);

    let prices = [100.0, 110.0, 99.0];
    let r: [f64; 2] = [0.1, 99.0 / 110.0 - 1.0];
    let mean = (r[0] + r[1]) / 2.0;
    let expected = (((r[0] - mean).powi(2) + (r[1] - mean).powi(2)) / 1.0).sqrt();
    assert!((return_volatility(&prices) - expected).abs() < 1e-12);
}

#[test]
fn test_band_scales_with_sqrt_horizon() {
    let (lo1, hi1) = uncertainty_band(100.0, 0.02, 1);
    let (lo4, hi4) = uncertainty_band(100.0, 0.02, 4);
    assert!((hi1 - lo1 - 4.0).abs() < 1e-9);
    assert!((hi4 - lo4 - 8.0).abs() < 1e-9);
}

#[test]
fn test_constant_series_collapses_band() {
    let prices = vec![100.0; 60];
    let projector = Projector::default();
    for id in ["linear", "ridge", "lasso", "elastic", "rf"] {
        let result = projector.project(&prices, 7, id).unwrap();
        assert_eq!(result.volatility, 0.0, "{}", id);
        assert_eq!(result.current_price, dec!(100));
        assert_eq!(result.projected_price, dec!(100), "{}", id);
        assert_eq!(result.low_price, result.projected_price);
        assert_eq!(result.high_price, result.projected_price);
    }
}

#[test]
fn test_rising_series_ols_projection() {
    let prices = rising(300);
    let projector = Projector::default();
    let raw = projector.project_raw(&prices, 10, ModelKind::Linear).unwrap();

    // last observation sits at index n - 1, the forecast at n + horizon
    assert_eq!(raw.current, 399.0);
    assert!((raw.projected - 410.0).abs() < 1e-6);
    assert!((raw.projected - (raw.current + 10.0 + 1.0)).abs() < 1e-6);

    let vol = return_volatility(&prices);
    assert!(vol > 0.0);
    let spread = vol * 10f64.sqrt();
    assert!((raw.low - raw.projected * (1.0 - spread)).abs() < 1e-9);
    assert!((raw.high - raw.projected * (1.0 + spread)).abs() < 1e-9);

    let rounded = projector.project(&prices, 10, "linear").unwrap();
    assert_eq!(rounded.current_price, dec!(399.00));
    assert_eq!(rounded.projected_price, dec!(410.00));
    assert!(rounded.low_price < rounded.projected_price);
    assert!(rounded.high_price > rounded.projected_price);
}

#[test]
fn test_trend_series_only_for_linear_models() {
    let prices = rising(30);
    let projector = Projector::default();

    let linear = projector.project(&prices, 5, "ridge").unwrap();
    let trend = linear.trend_series.expect("linear models expose a trend");
    assert_eq!(trend.len(), 30 + 5 + 1);
    assert_eq!(*trend.last().unwrap(), linear.projected_price);

    let forest = projector.project(&prices, 5, "rf").unwrap();
    assert!(forest.trend_series.is_none());
}

#[test]
fn test_forest_projection_stays_in_observed_range() {
    let prices = rising(50);
    let result = Projector::default().project(&prices, 20, "rf").unwrap();
    assert!(result.projected_price <= dec!(149));
    assert!(result.projected_price >= dec!(130));
}

#[test]
fn test_forest_projection_reproducible() {
    let prices: Vec<f64> = (0..40).map(|i| 20.0 + ((i * 7) % 5) as f64).collect();
    let a = Projector::default().project(&prices, 3, "rf").unwrap();
    let b = Projector::default().project(&prices, 3, "rf").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_projection_wire_format() {
    let result = Projector::default().project(&rising(20), 2, "linear").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["model"], "linear");
    assert_eq!(json["current_price"], 119.0);
    assert!(json["projected_price"].is_number());
    assert!(json["trend_series"].is_array());
    assert_eq!(json["horizon"], 2);

    let forest = Projector::default().project(&rising(20), 2, "rf").unwrap();
    let json = serde_json::to_value(&forest).unwrap();
    assert!(json.get("trend_series").is_none());
}
