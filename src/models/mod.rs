//! Regressor boundary.
//!
//! The pipeline hands a regressor `(batch, window, n_features)` windows and gets
//! back a `(batch, 1)` matrix of scaled predictions. It knows nothing else about
//! the model; `LinearWindowRegressor` is the in-tree implementation.

pub mod linear;

pub use linear::*;

use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Borrowed `(X, y)` pair in the scaled domain.
#[derive(Debug, Clone, Copy)]
pub struct Samples<'a> {
    pub x: &'a [DMatrix<f64>],
    pub y: &'a DVector<f64>,
}

/// Error metrics in the scaled target domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub n_train: usize,
    pub n_validation: usize,
    pub train_mse: f64,
    pub train_mae: f64,
    pub validation_mse: f64,
    pub validation_mae: f64,
}

pub trait Regressor {
    fn fit(&mut self, train: Samples<'_>, validation: Samples<'_>) -> Result<TrainReport, AppError>;

    /// Predict a `(batch, 1)` matrix of scaled targets.
    fn predict(&self, batch: &[DMatrix<f64>]) -> Result<DMatrix<f64>, AppError>;

    fn save(&self, path: &Path) -> Result<(), AppError>;
}

/// Mean squared and mean absolute error of `predicted` (batch x 1) against `actual`.
pub fn error_metrics(predicted: &DMatrix<f64>, actual: &DVector<f64>) -> (f64, f64) {
    let n = actual.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let (se, ae) = predicted
        .column(0)
        .iter()
        .zip(actual.iter())
        .fold((0.0, 0.0), |(se, ae), (p, a)| {
            let d = p - a;
            (se + d * d, ae + d.abs())
        });
    (se / n as f64, ae / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_match_hand_computation() {
        let predicted = DMatrix::from_column_slice(3, 1, &[1.0, 2.0, 4.0]);
        let actual = DVector::from_row_slice(&[1.0, 3.0, 2.0]);
        let (mse, mae) = error_metrics(&predicted, &actual);
        assert!((mse - 5.0 / 3.0).abs() < 1e-12);
        assert!((mae - 1.0).abs() < 1e-12);
    }
}
