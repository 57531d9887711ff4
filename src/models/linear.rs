//! Baseline regressor: ridge least squares on per-window summaries.
//!
//! Each window is summarised as
//!
//! ```text
//! [1, last row (n_features), column means (n_features)]
//! ```
//!
//! and the scaled target is regressed on that row. The fitted coefficients are
//! persisted as a small JSON artifact together with the input shape they expect
//! and the forecast horizon the targets were built with.

use std::fs::{self, File};
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::math::solve_least_squares;
use crate::models::{Regressor, Samples, TrainReport, error_metrics};

pub const DEFAULT_RIDGE: f64 = 1e-3;

/// Persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub window: usize,
    pub n_features: usize,
    pub ridge: f64,
    /// Minutes between the window end and the target row, minus one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<usize>,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LinearWindowRegressor {
    ridge: f64,
    horizon: Option<usize>,
    model: Option<LinearModel>,
}

impl Default for LinearWindowRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_RIDGE)
    }
}

impl LinearWindowRegressor {
    pub fn new(ridge: f64) -> Self {
        Self {
            ridge,
            horizon: None,
            model: None,
        }
    }

    /// Record the horizon the training targets were built with.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Load a previously saved artifact.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::missing_artifact(format!(
                "Model artifact not found: '{}'. Run `sfp train` first.",
                path.display()
            )));
        }
        let file = File::open(path)
            .map_err(|e| AppError::io(format!("Failed to open model '{}': {e}", path.display())))?;
        let model: LinearModel = serde_json::from_reader(file)
            .map_err(|e| AppError::data_format(format!("Invalid model artifact '{}': {e}", path.display())))?;
        if model.coefficients.len() != design_len(model.n_features) {
            return Err(AppError::data_format(format!(
                "Model artifact '{}' has {} coefficients for {} features.",
                path.display(),
                model.coefficients.len(),
                model.n_features
            )));
        }
        info!(path = %path.display(), window = model.window, features = model.n_features, "Model loaded");
        Ok(Self {
            ridge: model.ridge,
            horizon: model.horizon,
            model: Some(model),
        })
    }

    pub fn model(&self) -> Option<&LinearModel> {
        self.model.as_ref()
    }

    /// Input shape `(window, n_features)` the fitted model expects.
    pub fn input_shape(&self) -> Option<(usize, usize)> {
        self.model.as_ref().map(|m| (m.window, m.n_features))
    }

    /// Horizon the fitted model forecasts at; `None` for artifacts saved without one.
    pub fn horizon(&self) -> Option<usize> {
        self.model.as_ref().and_then(|m| m.horizon)
    }
}

impl Regressor for LinearWindowRegressor {
    fn fit(&mut self, train: Samples<'_>, validation: Samples<'_>) -> Result<TrainReport, AppError> {
        let first = train
            .x
            .first()
            .ok_or_else(|| AppError::insufficient_data("Cannot fit a model on an empty training set."))?;
        let (window, n_features) = first.shape();
        if train.x.len() != train.y.len() {
            return Err(AppError::data_format("Training windows and targets differ in length."));
        }

        let design = design_matrix(train.x, window, n_features)?;
        let beta = solve_least_squares(&design, train.y, self.ridge).ok_or_else(|| {
            AppError::insufficient_data("Least squares system is too ill-conditioned to solve.")
        })?;

        self.model = Some(LinearModel {
            window,
            n_features,
            ridge: self.ridge,
            horizon: self.horizon,
            coefficients: beta.iter().copied().collect(),
        });

        let (train_mse, train_mae) = error_metrics(&self.predict(train.x)?, train.y);
        let (validation_mse, validation_mae) = error_metrics(&self.predict(validation.x)?, validation.y);
        let report = TrainReport {
            n_train: train.x.len(),
            n_validation: validation.x.len(),
            train_mse,
            train_mae,
            validation_mse,
            validation_mae,
        };
        info!(
            train_mse = report.train_mse,
            validation_mse = report.validation_mse,
            "Model fitted"
        );
        Ok(report)
    }

    fn predict(&self, batch: &[DMatrix<f64>]) -> Result<DMatrix<f64>, AppError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| AppError::not_fitted("Load or train a model before predicting."))?;
        if batch.is_empty() {
            return Ok(DMatrix::zeros(0, 1));
        }
        let design = design_matrix(batch, model.window, model.n_features)?;
        let beta = DVector::from_column_slice(&model.coefficients);
        let y = design * beta;
        Ok(DMatrix::from_column_slice(y.len(), 1, y.as_slice()))
    }

    fn save(&self, path: &Path) -> Result<(), AppError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| AppError::not_fitted("No fitted model to save."))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
        }
        let file = File::create(path)
            .map_err(|e| AppError::io(format!("Failed to create model '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, model)
            .map_err(|e| AppError::io(format!("Failed to write model: {e}")))?;
        info!(path = %path.display(), "Model saved");
        Ok(())
    }
}

fn design_len(n_features: usize) -> usize {
    1 + 2 * n_features
}

fn design_matrix(batch: &[DMatrix<f64>], window: usize, n_features: usize) -> Result<DMatrix<f64>, AppError> {
    let mut design = DMatrix::zeros(batch.len(), design_len(n_features));
    for (i, w) in batch.iter().enumerate() {
        if w.shape() != (window, n_features) {
            return Err(AppError::data_format(format!(
                "Expected windows of shape ({window}, {n_features}), got {:?}.",
                w.shape()
            )));
        }
        design[(i, 0)] = 1.0;
        for j in 0..n_features {
            design[(i, 1 + j)] = w[(window - 1, j)];
            design[(i, 1 + n_features + j)] = w.column(j).mean();
        }
    }
    Ok(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Windows of one feature ramping from `start`; target = last value + 0.1.
    fn ramp(n: usize) -> (Vec<DMatrix<f64>>, DVector<f64>) {
        let x: Vec<_> = (0..n)
            .map(|i| DMatrix::from_fn(4, 1, |r, _| 0.01 * (i + r) as f64))
            .collect();
        let y = DVector::from_iterator(n, (0..n).map(|i| 0.01 * (i + 3) as f64 + 0.1));
        (x, y)
    }

    #[test]
    fn learns_a_linear_relation() {
        let (x, y) = ramp(40);
        let mut model = LinearWindowRegressor::new(0.0);
        let report = model
            .fit(Samples { x: &x[..30], y: &y.rows(0, 30).into_owned() }, Samples {
                x: &x[30..],
                y: &y.rows(30, 10).into_owned(),
            })
            .unwrap();
        assert!(report.train_mse < 1e-12);
        assert!(report.validation_mse < 1e-12);
        assert_eq!(report.n_validation, 10);
    }

    #[test]
    fn predicting_before_fit_is_not_fitted() {
        let model = LinearWindowRegressor::default();
        let err = model.predict(&[DMatrix::zeros(4, 1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFitted);
    }

    #[test]
    fn wrong_window_shape_is_rejected() {
        let (x, y) = ramp(10);
        let mut model = LinearWindowRegressor::default();
        model.fit(Samples { x: &x, y: &y }, Samples { x: &x, y: &y }).unwrap();
        let err = model.predict(&[DMatrix::zeros(5, 1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn save_and_load_predict_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_model").join("sfp_linear.json");
        let (x, y) = ramp(20);
        let mut model = LinearWindowRegressor::default().with_horizon(15);
        model.fit(Samples { x: &x, y: &y }, Samples { x: &x, y: &y }).unwrap();
        model.save(&path).unwrap();

        let loaded = LinearWindowRegressor::load(&path).unwrap();
        assert_eq!(loaded.input_shape(), Some((4, 1)));
        assert_eq!(loaded.horizon(), Some(15));
        let a = model.predict(&x[..1]).unwrap();
        let b = loaded.predict(&x[..1]).unwrap();
        assert_eq!(b.shape(), (1, 1));
        assert!((a[(0, 0)] - b[(0, 0)]).abs() < 1e-9);
    }

    #[test]
    fn artifact_without_horizon_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sfp_linear.json");
        fs::write(
            &path,
            r#"{"window": 2, "n_features": 1, "ridge": 0.001, "coefficients": [0.5, 1.0, 0.0]}"#,
        )
        .unwrap();

        let loaded = LinearWindowRegressor::load(&path).unwrap();
        assert_eq!(loaded.horizon(), None);
        let y = loaded.predict(&[DMatrix::from_column_slice(2, 1, &[1.0, 2.0])]).unwrap();
        assert!((y[(0, 0)] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn loading_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LinearWindowRegressor::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
    }
}
