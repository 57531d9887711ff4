//! Sliding-window tensors for supervised training and live inference.
//!
//! For a dataset of `N` rows, window length `W` and horizon `H`, start index `i`
//! (with `i + W + H < N`) yields
//!
//! ```text
//! X = features[i .. i + W]        (W x n_features)
//! y = target[i + W + H]
//! ```
//!
//! The target is sampled `H` rows after the *end* of the window, so the window
//! never contains the value it is asked to predict.

use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{Column, TimeTable};
use crate::error::AppError;
use crate::math::{backward_fill, forward_fill};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub window: usize,
    pub horizon: usize,
}

/// Windows and aligned targets built from one dataset snapshot.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub x: Vec<DMatrix<f64>>,
    pub y: DVector<f64>,
    pub feature_names: Vec<String>,
    /// Timestamp of the row each target was taken from.
    pub target_times: Vec<DateTime<Utc>>,
    /// Start positions dropped because the window or target had missing cells.
    pub skipped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Every column except the target, in table order (`time_tag` is the index, not a column).
pub fn feature_columns<'a>(table: &'a TimeTable, target: &str) -> Vec<&'a Column> {
    table.columns().iter().filter(|c| c.name != target).collect()
}

pub fn build_training_windows(table: &TimeTable, spec: WindowSpec, target: &str) -> Result<TrainingSet, AppError> {
    if spec.window == 0 {
        return Err(AppError::config("Window length must be > 0."));
    }
    let target_col = table
        .column(target)
        .ok_or_else(|| AppError::data_format(format!("Dataset has no target column `{target}`.")))?;
    let features = feature_columns(table, target);
    if features.is_empty() {
        return Err(AppError::data_format("Dataset has no feature columns besides the target."));
    }

    let n = table.len();
    let span = spec.window + spec.horizon;
    let starts = n.saturating_sub(span);
    if starts == 0 {
        return Err(AppError::insufficient_data(format!(
            "Need more than {span} rows (window {} + horizon {}) to build a training window, found {n}.",
            spec.window, spec.horizon
        )));
    }

    let built: Vec<Option<(DMatrix<f64>, f64, DateTime<Utc>)>> = (0..starts)
        .into_par_iter()
        .map(|i| {
            let target_idx = i + span;
            let y = target_col.values[target_idx]?;
            let x = window_matrix(&features, i, spec.window)?;
            Some((x, y, table.index()[target_idx]))
        })
        .collect();

    let mut x = Vec::with_capacity(built.len());
    let mut y = Vec::with_capacity(built.len());
    let mut target_times = Vec::with_capacity(built.len());
    for (xi, yi, ti) in built.into_iter().flatten() {
        x.push(xi);
        y.push(yi);
        target_times.push(ti);
    }
    let skipped = starts - x.len();

    if skipped > 0 {
        warn!(skipped, "Windows with missing feature or target values were skipped");
    }
    if x.is_empty() {
        return Err(AppError::insufficient_data(
            "Every candidate window contained missing values; no training data.",
        ));
    }
    info!(
        windows = x.len(),
        window = spec.window,
        horizon = spec.horizon,
        features = features.len(),
        "Training windows built"
    );

    Ok(TrainingSet {
        x,
        y: DVector::from_vec(y),
        feature_names: features.iter().map(|c| c.name.clone()).collect(),
        target_times,
        skipped,
    })
}

/// The most recent `window` rows of feature columns, ready for the predictor.
///
/// Isolated missing cells inside the window are filled from their neighbours
/// within the window; a feature that is missing for the whole window is an error.
pub fn latest_window(table: &TimeTable, window: usize, target: &str) -> Result<DMatrix<f64>, AppError> {
    let n = table.len();
    if window == 0 || n < window {
        return Err(AppError::insufficient_data(format!(
            "Dataset too small: requires at least {window} rows, found {n}."
        )));
    }
    let features = feature_columns(table, target);
    let start = n - window;

    let mut out = DMatrix::zeros(window, features.len());
    for (j, column) in features.iter().enumerate() {
        let mut values = column.values[start..].to_vec();
        let gaps = values.iter().filter(|v| v.is_none()).count();
        if gaps > 0 {
            debug!(column = %column.name, gaps, "Filling gaps in the inference window");
            forward_fill(&mut values);
            backward_fill(&mut values);
        }
        for (r, v) in values.into_iter().enumerate() {
            out[(r, j)] = v.ok_or_else(|| {
                AppError::insufficient_data(format!(
                    "Feature `{}` has no values in the latest {window} rows.",
                    column.name
                ))
            })?;
        }
    }

    Ok(out)
}

fn window_matrix(features: &[&Column], start: usize, window: usize) -> Option<DMatrix<f64>> {
    let mut m = DMatrix::zeros(window, features.len());
    for (j, column) in features.iter().enumerate() {
        for r in 0..window {
            m[(r, j)] = column.values[start + r]?;
        }
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LONG_CHANNEL;
    use crate::error::ErrorKind;
    use chrono::{Duration, TimeZone};

    /// `n` rows: feature `row_index` = i, feature `double` = 2i, target = i.
    fn toy(n: usize) -> TimeTable {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let index = (0..n).map(|i| t0 + Duration::minutes(i as i64)).collect();
        let seq = |k: f64| (0..n).map(|i| Some(k * i as f64)).collect::<Vec<_>>();
        TimeTable::new(
            index,
            vec![
                Column::new("row_index", seq(1.0)),
                Column::new(LONG_CHANNEL, seq(1.0)),
                Column::new("double", seq(2.0)),
            ],
        )
        .unwrap()
    }

    const SPEC: WindowSpec = WindowSpec {
        window: 180,
        horizon: 90,
    };

    #[test]
    fn targets_are_horizon_after_window_end() {
        let set = build_training_windows(&toy(300), SPEC, LONG_CHANNEL).unwrap();

        assert_eq!(set.len(), 300 - 180 - 90);
        assert_eq!(set.feature_names, vec!["row_index", "double"]);
        for (start, (x, y)) in set.x.iter().zip(set.y.iter()).enumerate() {
            assert_eq!(x.shape(), (180, 2));
            assert_eq!(x[(0, 0)], start as f64);
            assert_eq!(x[(179, 0)], (start + 179) as f64);
            assert_eq!(*y, (start + 180 + 90) as f64);
            // Target lies strictly after the window.
            assert!(*y > x[(179, 0)]);
        }
    }

    #[test]
    fn too_short_dataset_is_insufficient() {
        let err = build_training_windows(&toy(270), SPEC, LONG_CHANNEL).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert_eq!(build_training_windows(&toy(271), SPEC, LONG_CHANNEL).unwrap().len(), 1);
    }

    #[test]
    fn windows_touching_missing_cells_are_skipped() {
        let mut table = toy(20);
        table.column_mut("double").unwrap().values[5] = None;
        let spec = WindowSpec { window: 4, horizon: 2 };

        let set = build_training_windows(&table, spec, LONG_CHANNEL).unwrap();
        // Starts 2..=5 include row 5 in their window.
        assert_eq!(set.skipped, 4);
        assert_eq!(set.len(), 20 - 6 - 4);
        assert_eq!(set.y[0], 6.0);
        assert_eq!(set.y[2], 12.0);
    }

    #[test]
    fn missing_target_column_is_a_format_error() {
        let err = build_training_windows(&toy(300), SPEC, "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn latest_window_takes_tail_without_target() {
        let window = latest_window(&toy(300), 180, LONG_CHANNEL).unwrap();
        assert_eq!(window.shape(), (180, 2));
        assert_eq!(window[(0, 0)], 120.0);
        assert_eq!(window[(179, 1)], 2.0 * 299.0);
    }

    #[test]
    fn latest_window_requires_enough_rows() {
        let err = latest_window(&toy(179), 180, LONG_CHANNEL).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn latest_window_fills_isolated_gaps() {
        let mut table = toy(10);
        table.column_mut("row_index").unwrap().values[9] = None;
        let window = latest_window(&table, 3, LONG_CHANNEL).unwrap();
        assert_eq!(window[(2, 0)], 8.0);
    }
}
