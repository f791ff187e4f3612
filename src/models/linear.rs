//! Closed-form least squares: ordinary and ridge
//!
//! Solves the centered normal equations `(XcᵀXc + αI)β = Xcᵀyc` and recovers
//! the intercept as `ȳ - x̄·β`, so the intercept is never penalized.

use super::linalg::{self, solve_spd};
use super::{LinearFit, ModelKind, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct LeastSquares {
    kind: ModelKind,
    alpha: f64,
    fit: Option<LinearFit>,
}

impl LeastSquares {
    pub fn ordinary() -> Self {
        Self::new(ModelKind::Linear, 0.0)
    }

    pub fn ridge(alpha: f64) -> Self {
        Self::new(ModelKind::Ridge, alpha)
    }

    pub(crate) fn new(kind: ModelKind, alpha: f64) -> Self {
        Self {
            kind,
            alpha,
            fit: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Regressor for LeastSquares {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        linalg::check_shapes(x, y)?;
        let c = linalg::center(x, y)?;

        let mut xtx = c.x.t().dot(&c.x);
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += self.alpha;
        }
        let xty = c.x.t().dot(&c.y);

        let coefficients = solve_spd(&xtx, &xty)?;
        let intercept = c.y_mean - c.x_mean.dot(&coefficients);

        tracing::debug!(
            model = self.kind.id(),
            rows = x.nrows(),
            cols = x.ncols(),
            intercept,
            "Fitted least squares"
        );

        self.fit = Some(LinearFit {
            coefficients,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or(ForecastError::NotFitted(self.kind.id()))?;
        fit.apply(x)
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn linear_fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }
}
