//! Horizon projection over a time-index regression
//!
//! Deliberately separate from the evaluation path: the single feature is the
//! integer index `0..n`, the target is the raw close (not a return). The
//! point forecast is the fit evaluated at index `n + horizon` and the band
//! widens with `sqrt(horizon)` under a random-walk assumption:
//!
//! ```text
//! low  = projected · (1 − σ·√h)
//! high = projected · (1 + σ·√h)
//! ```
//!
//! where `σ` is the sample standard deviation of one-period returns over the
//! whole history. Horizons are capped at [`MAX_HORIZON`] periods.
//!
//! An empty history is rejected with `InsufficientData`: there is no current
//! price to anchor the band on.

#[cfg(test)]
mod tests;

use crate::error::{ForecastError, Result};
use crate::features::frame::{pct_change, sample_std};
use crate::models::{ModelKind, ModelRegistry};
use crate::types::to_money;
use ndarray::{Array1, Array2};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point forecast with its uncertainty band, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub model: ModelKind,
    pub current_price: Decimal,
    pub projected_price: Decimal,
    pub low_price: Decimal,
    pub high_price: Decimal,
    /// Per-period return volatility, full precision
    pub volatility: f64,
    pub horizon: u32,
    /// Fitted trend over indices `0..=n + horizon`, linear models only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_series: Option<Vec<Decimal>>,
}

/// Full-precision forecast before rounding
#[derive(Debug, Clone, PartialEq)]
pub struct RawProjection {
    pub current: f64,
    pub projected: f64,
    pub low: f64,
    pub high: f64,
    pub volatility: f64,
    pub trend: Option<Vec<f64>>,
}

/// Longest projection, in periods (about ten years of daily bars)
pub const MAX_HORIZON: u32 = 3650;

/// Accept horizons in `1..=MAX_HORIZON`
pub fn validate_horizon(horizon: i64) -> Result<u32> {
    match u32::try_from(horizon) {
        Ok(h) if (1..=MAX_HORIZON).contains(&h) => Ok(h),
        _ => Err(ForecastError::InvalidHorizon(horizon)),
    }
}

/// Sample standard deviation of one-period returns
///
/// Zero when there are fewer than two defined returns.
pub fn return_volatility(prices: &[f64]) -> f64 {
    let returns: Vec<f64> = pct_change(prices)
        .into_iter()
        .flatten()
        .filter(|r| r.is_finite())
        .collect();
    let sd = sample_std(&returns);
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

/// `(low, high)` around `projected` for the given horizon
pub fn uncertainty_band(projected: f64, volatility: f64, horizon: u32) -> (f64, f64) {
    let spread = volatility * f64::from(horizon).sqrt();
    (projected * (1.0 - spread), projected * (1.0 + spread))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    registry: ModelRegistry,
}

impl Projector {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Validate inputs, fit, and round at the boundary
    pub fn project(&self, prices: &[f64], horizon: i64, model_id: &str) -> Result<ProjectionResult> {
        let horizon = validate_horizon(horizon)?;
        let kind = self.registry.resolve(model_id)?;
        self.project_with(prices, horizon, kind)
    }

    /// Fit with an already resolved model and round the figures
    pub fn project_with(&self, prices: &[f64], horizon: u32, kind: ModelKind) -> Result<ProjectionResult> {
        let raw = self.project_raw(prices, horizon, kind)?;

        Ok(ProjectionResult {
            model: kind,
            current_price: to_money(raw.current)?,
            projected_price: to_money(raw.projected)?,
            low_price: to_money(raw.low)?,
            high_price: to_money(raw.high)?,
            volatility: raw.volatility,
            horizon,
            trend_series: raw
                .trend
                .map(|t| t.into_iter().map(to_money).collect::<Result<Vec<_>>>())
                .transpose()?,
        })
    }

    pub fn project_raw(&self, prices: &[f64], horizon: u32, kind: ModelKind) -> Result<RawProjection> {
        let current = *prices.last().ok_or(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let n = prices.len();

        let index = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let target = Array1::from(prices.to_vec());

        let mut model = self.registry.build(kind);
        model.fit(&index, &target)?;

        let future = Array2::from_elem((1, 1), (n + horizon as usize) as f64);
        let projected = model.predict(&future)?[0];

        let volatility = return_volatility(prices);
        let (low, high) = uncertainty_band(projected, volatility, horizon);

        let trend = if kind.is_linear() {
            let span = n + horizon as usize + 1;
            let all = Array2::from_shape_fn((span, 1), |(i, _)| i as f64);
            Some(model.predict(&all)?.to_vec())
        } else {
            None
        };

        tracing::debug!(
            model = kind.id(),
            rows = n,
            horizon,
            projected,
            volatility,
            "Projected price"
        );

        Ok(RawProjection {
            current,
            projected,
            low,
            high,
            volatility,
            trend,
        })
    }
}
