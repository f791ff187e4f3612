//! Named-column table with joint validity filtering
//!
//! Columns hold `Option<f64>` cells. A row survives [`Frame::filter_valid`]
//! only when every column has a finite value in it, so features and target
//! are trimmed in a single pass and cannot drift out of alignment.

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column with every cell defined
    pub fn dense(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Some).collect())
    }

    fn is_defined(&self, row: usize) -> bool {
        matches!(self.values.get(row), Some(Some(v)) if v.is_finite())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    rows: usize,
    columns: Vec<Column>,
}

impl Frame {
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn push(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.rows {
            return Err(ForecastError::DimensionMismatch {
                expected: self.rows,
                got: column.values.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// AND of every column's definedness, row by row
    pub fn validity_mask(&self) -> Vec<bool> {
        (0..self.rows)
            .map(|row| self.columns.iter().all(|c| c.is_defined(row)))
            .collect()
    }

    /// Keep only rows where every column is defined
    ///
    /// Returns the surviving original row indices along with the dense
    /// filtered frame.
    pub fn filter_valid(&self) -> (Vec<usize>, DenseFrame) {
        let mask = self.validity_mask();
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &ok)| ok.then_some(i))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = kept.iter().filter_map(|&i| c.values[i]).collect();
                (c.name.clone(), values)
            })
            .collect();

        (kept, DenseFrame { columns })
    }
}

/// Frame after filtering, every cell present
#[derive(Debug, Clone)]
pub struct DenseFrame {
    columns: Vec<(String, Vec<f64>)>,
}

impl DenseFrame {
    /// Remove a column by name and return its values
    pub fn take(&mut self, name: &str) -> Option<Vec<f64>> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn columns(&self) -> impl Iterator<Item = &[f64]> {
        self.columns.iter().map(|(_, v)| v.as_slice())
    }
}

// ============ Column transforms ============

/// One-period fractional change, undefined for the first row
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    shifted_change(values, 1, |cur, prev| cur / prev - 1.0)
}

/// `values[t] - values[t - lag]`
pub fn difference(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    shifted_change(values, lag, |cur, prev| cur - prev)
}

fn shifted_change(values: &[f64], lag: usize, f: impl Fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if t < lag {
                None
            } else {
                Some(f(values[t], values[t - lag]))
            }
        })
        .collect()
}

/// Trailing sample standard deviation over `window` rows
///
/// Undefined until `window` consecutive defined inputs are available.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if window < 2 || t + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[t + 1 - window..=t]
                .iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            slice.map(|s| sample_std(&s))
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Shift a column up by one row so row `t` holds the value from `t + 1`
pub fn lead(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| values.get(t + 1).copied().flatten())
        .collect()
}
