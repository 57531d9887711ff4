//! Min-max feature scaling and log-domain target scaling.
//!
//! A scaler is either `Unfitted` or `Fitted`; only [`FittedScaler`] can transform,
//! and the only ways to obtain one are fitting on training data or loading the
//! blobs a training run saved. Transforming never refits, so values outside the
//! training range map outside `[0, 1]`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

/// Flux is strictly positive physically; zeros/negatives are clamped here before log10.
pub const TARGET_FLOOR: f64 = 1e-12;

/// Per-column min/max learned from training data, mapping `[min, max]` onto `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxParams {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

impl MinMaxParams {
    /// Fit over `rows`, each of length `n`. Non-finite cells are ignored.
    fn fit<'a, I>(n: usize, rows: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut data_min = vec![f64::INFINITY; n];
        let mut data_max = vec![f64::NEG_INFINITY; n];
        for row in rows {
            for (j, &v) in row.iter().enumerate().filter(|(_, v)| v.is_finite()) {
                data_min[j] = data_min[j].min(v);
                data_max[j] = data_max[j].max(v);
            }
        }
        if let Some(j) = data_min.iter().position(|v| !v.is_finite()) {
            return Err(AppError::insufficient_data(format!(
                "Cannot fit scaler: column {j} has no finite training values."
            )));
        }
        Ok(Self { data_min, data_max })
    }

    pub fn len(&self) -> usize {
        self.data_min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_min.is_empty()
    }

    fn range(&self, j: usize) -> f64 {
        let r = self.data_max[j] - self.data_min[j];
        if r == 0.0 { 1.0 } else { r }
    }

    pub fn scale(&self, j: usize, v: f64) -> f64 {
        (v - self.data_min[j]) / self.range(j)
    }

    pub fn unscale(&self, j: usize, s: f64) -> f64 {
        s * self.range(j) + self.data_min[j]
    }
}

/// Target transform: optional log10 (with [`TARGET_FLOOR`]) followed by min-max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetParams {
    pub log10: bool,
    pub minmax: MinMaxParams,
}

impl TargetParams {
    fn forward(&self, y: f64) -> f64 {
        let v = if self.log10 { y.max(TARGET_FLOOR).log10() } else { y };
        self.minmax.scale(0, v)
    }

    fn inverse(&self, s: f64) -> f64 {
        let v = self.minmax.unscale(0, s);
        if self.log10 { 10f64.powf(v) } else { v }
    }
}

/// The (x, y) transforms of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    x: MinMaxParams,
    y: TargetParams,
}

impl FittedScaler {
    /// Fit both transforms on training windows `(N, W, F)` (flattened to `(N*W, F)`) and targets.
    pub fn fit(x: &[DMatrix<f64>], y: &DVector<f64>, log10_target: bool) -> Result<Self, AppError> {
        let n_features = x.first().map(|w| w.ncols()).ok_or_else(|| {
            AppError::insufficient_data("Cannot fit scaler on an empty training set.")
        })?;
        if x.iter().any(|w| w.ncols() != n_features) {
            return Err(AppError::data_format("Training windows have inconsistent feature counts."));
        }

        let rows: Vec<Vec<f64>> = x
            .iter()
            .flat_map(|w| w.row_iter().map(|r| r.iter().copied().collect::<Vec<_>>()).collect::<Vec<_>>())
            .collect();
        let x_params = MinMaxParams::fit(n_features, rows.iter().map(Vec::as_slice))?;

        let y_pre: Vec<f64> = y
            .iter()
            .map(|&v| if log10_target { v.max(TARGET_FLOOR).log10() } else { v })
            .collect();
        let y_params = MinMaxParams::fit(1, y_pre.chunks(1))?;

        Ok(Self {
            x: x_params,
            y: TargetParams {
                log10: log10_target,
                minmax: y_params,
            },
        })
    }

    pub fn n_features(&self) -> usize {
        self.x.len()
    }

    pub fn transform_window(&self, window: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if window.ncols() != self.n_features() {
            return Err(AppError::data_format(format!(
                "Scaler was fitted on {} features, got {}.",
                self.n_features(),
                window.ncols()
            )));
        }
        let mut out = window.clone();
        for (j, mut column) in out.column_iter_mut().enumerate() {
            column.apply(|v| *v = self.x.scale(j, *v));
        }
        Ok(out)
    }

    pub fn transform_features(&self, x: &[DMatrix<f64>]) -> Result<Vec<DMatrix<f64>>, AppError> {
        x.iter().map(|w| self.transform_window(w)).collect()
    }

    pub fn transform_target(&self, y: &DVector<f64>) -> DVector<f64> {
        y.map(|v| self.y.forward(v))
    }

    /// Undo target scaling (and log10) on a `(batch, 1)` prediction.
    pub fn inverse_transform_target(&self, scaled: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_iterator(scaled.nrows(), scaled.column(0).iter().map(|&s| self.y.inverse(s)))
    }
}

/// Scaler lifecycle state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeatureScaler {
    #[default]
    Unfitted,
    Fitted(FittedScaler),
}

impl FeatureScaler {
    pub fn new() -> Self {
        Self::Unfitted
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, Self::Fitted(_))
    }

    pub fn fitted(&self) -> Result<&FittedScaler, AppError> {
        match self {
            Self::Fitted(s) => Ok(s),
            Self::Unfitted => Err(AppError::not_fitted(
                "Scalers have not been fitted yet; fit on training data or load saved scalers first.",
            )),
        }
    }

    /// Fit on the training split only and return the scaled training tensors.
    pub fn fit_and_scale(
        &mut self,
        x_train: &[DMatrix<f64>],
        y_train: &DVector<f64>,
    ) -> Result<(Vec<DMatrix<f64>>, DVector<f64>), AppError> {
        let fitted = FittedScaler::fit(x_train, y_train, true)?;
        let x = fitted.transform_features(x_train)?;
        let y = fitted.transform_target(y_train);
        info!(features = fitted.n_features(), windows = x.len(), "Scalers fitted on training split");
        *self = Self::Fitted(fitted);
        Ok((x, y))
    }

    /// Apply the fitted transforms to test or live data.
    pub fn transform(
        &self,
        x: &[DMatrix<f64>],
        y: Option<&DVector<f64>>,
    ) -> Result<(Vec<DMatrix<f64>>, Option<DVector<f64>>), AppError> {
        let fitted = self.fitted()?;
        let x = fitted.transform_features(x)?;
        Ok((x, y.map(|y| fitted.transform_target(y))))
    }

    pub fn inverse_transform_target(&self, scaled: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        Ok(self.fitted()?.inverse_transform_target(scaled))
    }

    /// Write `<prefix>_x_scaler.json` and `<prefix>_y_scaler.json` into `dir`.
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<(), AppError> {
        let fitted = self.fitted()?;
        fs::create_dir_all(dir)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
        let (x_path, y_path) = blob_paths(dir, prefix);
        write_blob(&x_path, &fitted.x)?;
        write_blob(&y_path, &fitted.y)?;
        info!(dir = %dir.display(), "Scalers saved");
        Ok(())
    }

    pub fn load(dir: &Path, prefix: &str) -> Result<Self, AppError> {
        let (x_path, y_path) = blob_paths(dir, prefix);
        for path in [&x_path, &y_path] {
            if !path.is_file() {
                return Err(AppError::missing_artifact(format!(
                    "Scaler file not found: '{}'. Run `sfp train` first.",
                    path.display()
                )));
            }
        }
        let x: MinMaxParams = read_blob(&x_path)?;
        let y: TargetParams = read_blob(&y_path)?;
        if x.data_min.len() != x.data_max.len() || y.minmax.len() != 1 {
            return Err(AppError::data_format("Scaler blobs have inconsistent shapes."));
        }
        info!(dir = %dir.display(), "Scalers loaded");
        Ok(Self::Fitted(FittedScaler { x, y }))
    }
}

fn blob_paths(dir: &Path, prefix: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{prefix}_x_scaler.json")),
        dir.join(format!("{prefix}_y_scaler.json")),
    )
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

fn read_blob<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::data_format(format!("Invalid scaler blob '{}': {e}", path.display())))
}
