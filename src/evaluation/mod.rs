//! Chronological train/test evaluation
//!
//! The first 80% of rows train the model, the most recent 20% score it.
//! Rows are never shuffled, so no future observation reaches the fit.


use crate::error::{ForecastError, Result};
use crate::features::{FeatureMatrix, TargetVector};
use crate::models::Regressor;
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

pub const TEST_FRACTION: f64 = 0.2;

/// Scores on the held-out partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mean_squared_error: f64,
    #[serde(rename = "r2_score")]
    pub r_squared: f64,
    pub mean_absolute_error: f64,
    /// Prediction for the most recent test row
    pub last_prediction: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Row counts of a chronological split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub train: usize,
    pub test: usize,
}

impl Split {
    /// `test = ceil(rows · fraction)`, `train` takes the rest
    pub fn chronological(rows: usize, test_fraction: f64) -> Result<Self> {
        let test = (rows as f64 * test_fraction).ceil() as usize;
        let test = test.min(rows);
        let train = rows - test;

        if train == 0 {
            return Err(ForecastError::EmptyPartition {
                partition: "train",
                rows,
            });
        }
        if test == 0 {
            return Err(ForecastError::EmptyPartition {
                partition: "test",
                rows,
            });
        }
        Ok(Self { train, test })
    }
}

/// Fits on the older rows and scores on the newer ones
#[derive(Debug, Clone, Copy)]
pub struct TrainEvaluator {
    test_fraction: f64,
}

impl Default for TrainEvaluator {
    fn default() -> Self {
        Self {
            test_fraction: TEST_FRACTION,
        }
    }
}

impl TrainEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &self,
        features: &FeatureMatrix,
        target: &TargetVector,
        model: &mut dyn Regressor,
    ) -> Result<EvaluationResult> {
        let rows = features.rows();
        if target.len() != rows {
            return Err(ForecastError::DimensionMismatch {
                expected: rows,
                got: target.len(),
            });
        }

        let split = Split::chronological(rows, self.test_fraction)?;
        tracing::debug!(
            model = model.kind().id(),
            train = split.train,
            test = split.test,
            "Chronological split"
        );

        let x_train = features.values.slice(s![..split.train, ..]).to_owned();
        let y_train = target.values.slice(s![..split.train]).to_owned();
        let x_test = features.values.slice(s![split.train.., ..]).to_owned();
        let y_test = target.values.slice(s![split.train..]).to_owned();

        model.fit(&x_train, &y_train)?;
        let predictions = model.predict(&x_test)?;

        let last_prediction = *predictions
            .last()
            .ok_or(ForecastError::EmptyPartition { partition: "test", rows })?;

        Ok(EvaluationResult {
            mean_squared_error: mean_squared_error(&y_test, &predictions),
            r_squared: r_squared(&y_test, &predictions),
            mean_absolute_error: mean_absolute_error(&y_test, &predictions),
            last_prediction,
            train_rows: split.train,
            test_rows: split.test,
        })
    }
}

// ============ Metrics ============

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n
}

/// Coefficient of determination
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r_squared(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
