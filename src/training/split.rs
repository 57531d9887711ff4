//! Chronological train/test split (never shuffled).

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::training::windows::TrainingSet;

#[derive(Debug, Clone)]
pub struct Split {
    pub train_x: Vec<DMatrix<f64>>,
    pub train_y: DVector<f64>,
    pub test_x: Vec<DMatrix<f64>>,
    pub test_y: DVector<f64>,
}

/// Hold out the last `ceil(n * test_fraction)` windows as the test set.
pub fn chronological_split(set: TrainingSet, test_fraction: f64) -> Result<Split, AppError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AppError::config(format!(
            "Test fraction must be in (0, 1), got {test_fraction}."
        )));
    }

    let n = set.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(AppError::insufficient_data(format!(
            "Cannot split {n} windows into non-empty train/test sets."
        )));
    }

    let mut train_x = set.x;
    let test_x = train_x.split_off(n_train);
    let train_y = set.y.rows(0, n_train).into_owned();
    let test_y = set.y.rows(n_train, n_test).into_owned();

    Ok(Split {
        train_x,
        train_y,
        test_x,
        test_y,
    })
}
