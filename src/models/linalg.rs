//! Small dense linear-algebra helpers shared by the linear estimators

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};

/// Design matrix and target with column means removed
pub struct Centered {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_mean: Array1<f64>,
    pub y_mean: f64,
}

pub fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: x.nrows(),
            got: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

pub fn center(x: &Array2<f64>, y: &Array1<f64>) -> Result<Centered> {
    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or(ForecastError::InsufficientData { required: 1, actual: 0 })?;
    let y_mean = y
        .mean()
        .ok_or(ForecastError::InsufficientData { required: 1, actual: 0 })?;
    Ok(Centered {
        x: x - &x_mean,
        y: y - y_mean,
        x_mean,
        y_mean,
    })
}

/// Solve `A x = b` for symmetric positive semi-definite `A`
///
/// Uses Cholesky. A non-positive pivot (collinear or constant columns) is
/// retried with a growing diagonal jitter.
pub fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let scale = a.diag().iter().fold(1.0_f64, |m, &v| m.max(v.abs()));

    let mut jitter = 0.0;
    for attempt in 0..8 {
        let mut reg = a.clone();
        for i in 0..n {
            reg[[i, i]] += jitter;
        }
        if let Some(l) = cholesky(&reg) {
            let solution = substitute(&l, b);
            if solution.iter().all(|v| v.is_finite()) {
                if attempt > 0 {
                    tracing::debug!(jitter, "Normal equations needed diagonal jitter");
                }
                return Ok(solution);
            }
        }
        jitter = scale * 1e-12 * 100f64.powi(attempt);
    }

    Err(ForecastError::Numerical(
        "normal equations are not positive definite".into(),
    ))
}

fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Forward then backward substitution through `L Lᵀ`
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }
    x
}
