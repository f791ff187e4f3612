//! Feature construction from raw OHLCV history
//!
//! Produces a feature matrix and a next-period return target that are
//! row-aligned by construction:
//! - raw open/high/low/volume are always kept, close is not
//! - optional derived columns: returns, momentum_5, volatility_5, volume_change
//! - target is built on the untrimmed series, then every column is filtered
//!   once through a joint validity mask

pub mod frame;


use crate::error::{ForecastError, Result};
use crate::types::TimeSeries;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use frame::{Column, Frame};

/// Lookback used by momentum and rolling volatility
pub const WINDOW: usize = 5;

const TARGET: &str = "target";

/// Optional derived feature groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Returns,
    Momentum,
    Volatility,
    Volume,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Returns,
        Feature::Momentum,
        Feature::Volatility,
        Feature::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Returns => "returns",
            Feature::Momentum => "momentum",
            Feature::Volatility => "volatility",
            Feature::Volume => "volume",
        }
    }

    /// Name of the column this feature contributes
    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::Returns => "return_1",
            Feature::Momentum => "momentum_5",
            Feature::Volatility => "volatility_5",
            Feature::Volume => "volume_change",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == key)
            .ok_or_else(|| ForecastError::InvalidFeature(s.trim().to_string()))
    }
}

/// Selected derived features
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        Self(features.into_iter().collect())
    }

    pub fn all() -> Self {
        Self::new(Feature::ALL)
    }

    /// Parse names such as `["returns", "momentum"]`
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !n.trim().is_empty())
            .map(Feature::from_str)
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    /// Parse a comma separated list
    pub fn parse_list(list: &str) -> Result<Self> {
        let names: Vec<&str> = list.split(',').collect();
        Self::parse(&names)
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    /// Leading rows consumed before every selected column is defined
    pub fn warmup_rows(&self) -> usize {
        self.iter()
            .map(|f| match f {
                Feature::Returns | Feature::Volume => 1,
                Feature::Momentum | Feature::Volatility => WINDOW,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|f| f.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Dense, row-aligned model inputs
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }
}

/// Next-period fractional close change, aligned with [`FeatureMatrix`]
#[derive(Debug, Clone)]
pub struct TargetVector {
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Array1<f64>,
}

impl TargetVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Turns a price series into (features, target)
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    features: FeatureSet,
}

impl FeatureBuilder {
    pub fn new(features: FeatureSet) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Assemble the untrimmed frame: baseline, derived, then target
    pub fn frame(&self, series: &TimeSeries) -> Result<Frame> {
        let bars = series.bars();
        let col = |f: fn(&crate::types::Bar) -> f64| bars.iter().map(f).collect::<Vec<f64>>();

        let close = col(|b| b.close);
        let volume = col(|b| b.volume);
        let returns = frame::pct_change(&close);

        let mut table = Frame::with_rows(bars.len());
        table.push(Column::dense("open", &col(|b| b.open)))?;
        table.push(Column::dense("high", &col(|b| b.high)))?;
        table.push(Column::dense("low", &col(|b| b.low)))?;
        table.push(Column::dense("volume", &volume))?;

        for feature in self.features.iter() {
            let values = match feature {
                Feature::Returns => returns.clone(),
                Feature::Momentum => frame::difference(&close, WINDOW),
                Feature::Volatility => frame::rolling_std(&returns, WINDOW),
                Feature::Volume => frame::pct_change(&volume),
            };
            table.push(Column::new(feature.column_name(), values))?;
        }

        table.push(Column::new(TARGET, frame::lead(&returns)))?;
        Ok(table)
    }

    /// Build the aligned feature matrix and target vector
    pub fn build(&self, series: &TimeSeries) -> Result<(FeatureMatrix, TargetVector)> {
        let table = self.frame(series)?;
        let (kept, mut dense) = table.filter_valid();

        if kept.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: self.features.warmup_rows() + 2,
                actual: series.len(),
            });
        }

        let dropped = series.len() - kept.len();
        let expected = self.features.warmup_rows() + 1;
        if dropped > expected {
            tracing::warn!(
                dropped,
                expected,
                "Dropped rows with undefined cells beyond the warm-up window"
            );
        }

        let target = dense
            .take(TARGET)
            .ok_or_else(|| ForecastError::Internal("target column missing".into()))?;
        let columns = dense.names();
        let rows = dense.rows();

        let mut values = Array2::<f64>::zeros((rows, columns.len()));
        for (j, column) in dense.columns().enumerate() {
            for (i, v) in column.iter().enumerate() {
                values[[i, j]] = *v;
            }
        }

        let all_ts = series.timestamps();
        let timestamps: Vec<DateTime<Utc>> = kept.iter().map(|&i| all_ts[i]).collect();

        tracing::debug!(rows, cols = columns.len(), features = %self.features, "Built feature matrix");

        Ok((
            FeatureMatrix {
                columns,
                timestamps: timestamps.clone(),
                values,
            },
            TargetVector {
                timestamps,
                values: Array1::from(target),
            },
        ))
    }
}
