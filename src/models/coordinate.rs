//! L1-penalized regression by cyclic coordinate descent
//!
//! Minimizes `(1/2n)‖y - Xβ‖² + αρ‖β‖₁ + α(1-ρ)/2 ‖β‖²` on centered data.
//! Lasso is the `ρ = 1` case.

use super::linalg;
use super::{LinearFit, ModelKind, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};

const MAX_ITER: usize = 1000;
const TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct CoordinateDescent {
    kind: ModelKind,
    alpha: f64,
    l1_ratio: f64,
    max_iter: usize,
    tolerance: f64,
    fit: Option<LinearFit>,
    iterations: usize,
}

impl CoordinateDescent {
    pub fn lasso(alpha: f64) -> Self {
        Self::new(ModelKind::Lasso, alpha, 1.0)
    }

    pub fn elastic_net(alpha: f64, l1_ratio: f64) -> Self {
        Self::new(ModelKind::ElasticNet, alpha, l1_ratio)
    }

    pub(crate) fn new(kind: ModelKind, alpha: f64, l1_ratio: f64) -> Self {
        Self {
            kind,
            alpha,
            l1_ratio,
            max_iter: MAX_ITER,
            tolerance: TOLERANCE,
            fit: None,
            iterations: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn l1_ratio(&self) -> f64 {
        self.l1_ratio
    }

    /// Sweeps used by the last fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn soft_threshold(x: f64, lambda: f64) -> f64 {
        if x > lambda {
            x - lambda
        } else if x < -lambda {
            x + lambda
        } else {
            0.0
        }
    }
}

impl Regressor for CoordinateDescent {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        linalg::check_shapes(x, y)?;
        let c = linalg::center(x, y)?;
        let n = x.nrows() as f64;
        let p = x.ncols();

        let l1 = self.alpha * self.l1_ratio * n;
        let l2 = self.alpha * (1.0 - self.l1_ratio) * n;
        let col_sq: Vec<f64> = c
            .x
            .columns()
            .into_iter()
            .map(|col| col.dot(&col))
            .collect();

        let mut coef = Array1::<f64>::zeros(p);
        let mut residual = c.y.clone();
        let mut converged = false;
        let mut sweeps = 0;

        for _ in 0..self.max_iter {
            sweeps += 1;
            let mut max_change: f64 = 0.0;

            for j in 0..p {
                if col_sq[j] <= f64::EPSILON {
                    coef[j] = 0.0;
                    continue;
                }
                let col = c.x.column(j);
                let old = coef[j];
                let rho = col.dot(&residual) + col_sq[j] * old;
                let new = Self::soft_threshold(rho, l1) / (col_sq[j] + l2);

                let delta = new - old;
                if delta != 0.0 {
                    residual.scaled_add(-delta, &col);
                    coef[j] = new;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.tolerance {
                converged = true;
                break;
            }
        }

        if !coef.iter().all(|v| v.is_finite()) {
            return Err(ForecastError::Numerical(format!(
                "{} coefficients diverged",
                self.kind.id()
            )));
        }
        if !converged {
            tracing::warn!(
                model = self.kind.id(),
                max_iter = self.max_iter,
                "Coordinate descent did not converge"
            );
        }

        let intercept = c.y_mean - c.x_mean.dot(&coef);
        self.iterations = sweeps;
        self.fit = Some(LinearFit {
            coefficients: coef,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.fit
            .as_ref()
            .ok_or(ForecastError::NotFitted(self.kind.id()))?
            .apply(x)
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn linear_fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }
}
