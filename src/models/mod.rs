//! Regression estimators and the model registry
//!
//! Every estimator implements [`Regressor`]. [`ModelRegistry`] maps an
//! identifier to a fresh, unfitted estimator configured from the constant
//! [`MODEL_TABLE`]:
//!
//! | id       | estimator                    | hyperparameters           |
//! |----------|------------------------------|---------------------------|
//! | `linear` | ordinary least squares       |                           |
//! | `ridge`  | L2 penalized least squares   | α = 1.0                   |
//! | `lasso`  | L1 penalized regression      | α = 0.001                 |
//! | `elastic`| elastic net                  | α = 0.001, l1_ratio = 0.5 |
//! | `rf`     | random forest                | 200 trees, seed 42        |

pub mod coordinate;
pub mod forest;
pub mod linalg;
pub mod linear;

#[cfg(test)]
mod tests;

pub use coordinate::CoordinateDescent;
pub use forest::{RandomForest, RegressionTree, TreeConfig};
pub use linear::LeastSquares;

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seed used by the forest unless the caller threads its own
pub const DEFAULT_SEED: u64 = 42;

/// Supervised regression estimator
pub trait Regressor: Send + Sync + fmt::Debug {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    fn kind(&self) -> ModelKind;

    /// Coefficients and intercept for fitted linear estimators
    fn linear_fit(&self) -> Option<&LinearFit> {
        None
    }
}

/// Fitted linear model `ŷ = X·β + b`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl LinearFit {
    pub fn apply(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Closed set of supported estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "ridge")]
    Ridge,
    #[serde(rename = "lasso")]
    Lasso,
    #[serde(rename = "elastic")]
    ElasticNet,
    #[serde(rename = "rf")]
    RandomForest,
}

/// Fixed hyperparameters for one table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hyperparameters {
    LeastSquares { alpha: f64 },
    ElasticNet { alpha: f64, l1_ratio: f64 },
    Forest { n_trees: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub id: &'static str,
    pub label: &'static str,
    pub params: Hyperparameters,
}

pub static MODEL_TABLE: [ModelSpec; 5] = [
    ModelSpec {
        kind: ModelKind::Linear,
        id: "linear",
        label: "Ordinary least squares",
        params: Hyperparameters::LeastSquares { alpha: 0.0 },
    },
    ModelSpec {
        kind: ModelKind::Ridge,
        id: "ridge",
        label: "Ridge regression",
        params: Hyperparameters::LeastSquares { alpha: 1.0 },
    },
    ModelSpec {
        kind: ModelKind::Lasso,
        id: "lasso",
        label: "Lasso regression",
        params: Hyperparameters::ElasticNet {
            alpha: 0.001,
            l1_ratio: 1.0,
        },
    },
    ModelSpec {
        kind: ModelKind::ElasticNet,
        id: "elastic",
        label: "Elastic net regression",
        params: Hyperparameters::ElasticNet {
            alpha: 0.001,
            l1_ratio: 0.5,
        },
    },
    ModelSpec {
        kind: ModelKind::RandomForest,
        id: "rf",
        label: "Random forest",
        params: Hyperparameters::Forest { n_trees: 200 },
    },
];

impl ModelKind {
    pub fn spec(&self) -> &'static ModelSpec {
        let row = match self {
            ModelKind::Linear => 0,
            ModelKind::Ridge => 1,
            ModelKind::Lasso => 2,
            ModelKind::ElasticNet => 3,
            ModelKind::RandomForest => 4,
        };
        &MODEL_TABLE[row]
    }

    pub fn id(&self) -> &'static str {
        self.spec().id
    }

    pub fn params(&self) -> Hyperparameters {
        self.spec().params
    }

    /// Linear estimators expose a fitted trend line
    pub fn is_linear(&self) -> bool {
        !matches!(self, ModelKind::RandomForest)
    }

    pub fn build(&self) -> Box<dyn Regressor> {
        self.build_seeded(DEFAULT_SEED)
    }

    /// Construct an unfitted estimator; `seed` only affects the forest
    pub fn build_seeded(&self, seed: u64) -> Box<dyn Regressor> {
        match self.params() {
            Hyperparameters::LeastSquares { alpha } => Box::new(LeastSquares::new(*self, alpha)),
            Hyperparameters::ElasticNet { alpha, l1_ratio } => {
                Box::new(CoordinateDescent::new(*self, alpha, l1_ratio))
            }
            Hyperparameters::Forest { n_trees } => Box::new(RandomForest::new(n_trees, seed)),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        MODEL_TABLE
            .iter()
            .find(|spec| spec.id == key)
            .map(|spec| spec.kind)
            .ok_or_else(|| ForecastError::InvalidModel(s.to_string()))
    }
}

/// Identifier → estimator factory
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    seed: u64,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

impl ModelRegistry {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Validate an identifier without constructing anything
    pub fn resolve(&self, id: &str) -> Result<ModelKind> {
        id.parse()
    }

    /// Fresh, unfitted estimator for `id`
    pub fn create(&self, id: &str) -> Result<Box<dyn Regressor>> {
        Ok(self.build(self.resolve(id)?))
    }

    pub fn build(&self, kind: ModelKind) -> Box<dyn Regressor> {
        kind.build_seeded(self.seed)
    }

    pub fn available(&self) -> impl Iterator<Item = &'static ModelSpec> {
        MODEL_TABLE.iter()
    }
}
