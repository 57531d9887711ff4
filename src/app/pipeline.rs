//! Shared pipeline steps behind the `sfp` subcommands.
//!
//! update:  NOAA feeds -> preprocess -> merge -> dataset CSV -> state.json
//! train:   dataset -> windows -> split -> scalers -> regressor -> artifacts
//! predict: artifacts + latest window -> flux -> NOAA class
//!
//! Each step returns a plain outcome struct; `app` decides how to print it.

use std::fs;
use std::path::{Path, PathBuf};
use std::slice;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::data::NoaaClient;
use crate::domain::{LONG_CHANNEL, PipelineConfig, SourceKind};
use crate::error::AppError;
use crate::features::build_batch;
use crate::io::{DatasetStore, StateFile, UpdateState, UpdateSummary};
use crate::models::{LinearWindowRegressor, Regressor, Samples, TrainReport};
use crate::report::{alert_description, flare_class};
use crate::training::{FeatureScaler, WindowSpec, build_training_windows, chronological_split, latest_window};

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub downloaded: bool,
    pub dataset_path: PathBuf,
    pub summary: UpdateSummary,
    pub state: UpdateState,
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub windows: usize,
    pub skipped: usize,
    pub feature_names: Vec<String>,
    pub report: TrainReport,
    pub model_path: PathBuf,
    pub scaler_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Prediction {
    /// Timestamp of the last row in the input window.
    pub as_of: DateTime<Utc>,
    /// When the forecast flux is expected.
    pub valid_at: DateTime<Utc>,
    pub flux: f64,
    pub class: String,
    pub alert: &'static str,
}

/// Refresh the source files (unless `download` is false), then fold them into the dataset.
pub fn run_update(config: &PipelineConfig, download: bool) -> Result<UpdateOutcome, AppError> {
    if download {
        NoaaClient::new()?.download_all(config)?;
    }

    let xray = read_source(config, SourceKind::Xray)?;
    let euv = read_source(config, SourceKind::Euv)?;
    let batch = build_batch(&xray, &euv)?;

    let store = DatasetStore::new(config.dataset_path());
    let summary = store.update(&batch)?;
    let state = StateFile::new(config.state_path()).save(Utc::now())?;
    info!(path = %config.state_path().display(), "Saved state file");

    Ok(UpdateOutcome {
        downloaded: download,
        dataset_path: store.path().to_path_buf(),
        summary,
        state,
    })
}

/// Build windows, fit scalers on the training split only, fit and persist the regressor.
pub fn run_train(config: &PipelineConfig, ridge: f64) -> Result<TrainOutcome, AppError> {
    let table = DatasetStore::new(config.dataset_path()).load_required()?;
    let spec = WindowSpec {
        window: config.window,
        horizon: config.horizon,
    };
    let set = build_training_windows(&table, spec, LONG_CHANNEL)?;
    let windows = set.len();
    let skipped = set.skipped;
    let feature_names = set.feature_names.clone();

    let split = chronological_split(set, config.test_fraction)?;

    let mut scaler = FeatureScaler::new();
    let (train_x, train_y) = scaler.fit_and_scale(&split.train_x, &split.train_y)?;
    let fitted = scaler.fitted()?;
    let test_x = fitted.transform_features(&split.test_x)?;
    let test_y = fitted.transform_target(&split.test_y);

    let mut model = LinearWindowRegressor::new(ridge).with_horizon(config.horizon);
    let report = model.fit(
        Samples {
            x: &train_x,
            y: &train_y,
        },
        Samples {
            x: &test_x,
            y: &test_y,
        },
    )?;
    let model_path = config.model_path();
    // Scalers are written only once the model artifact is on disk.
    model.save(&model_path)?;
    scaler.save(&config.model_dir, &config.scaler_prefix)?;

    Ok(TrainOutcome {
        windows,
        skipped,
        feature_names,
        report,
        model_path,
        scaler_dir: config.model_dir.clone(),
    })
}

/// Forecast from the most recent window of the stored dataset.
pub fn run_predict(config: &PipelineConfig) -> Result<Prediction, AppError> {
    let model = LinearWindowRegressor::load(&config.model_path())?;
    let scaler = FeatureScaler::load(&config.model_dir, &config.scaler_prefix)?;
    let window = model.input_shape().map_or(config.window, |(w, _)| w);
    let horizon = model.horizon().unwrap_or(config.horizon);

    let table = DatasetStore::new(config.dataset_path()).load_required()?;
    let x = latest_window(&table, window, LONG_CHANNEL)?;
    let (scaled, _) = scaler.transform(slice::from_ref(&x), None)?;
    let predicted = model.predict(&scaled)?;
    let decoded = scaler.inverse_transform_target(&predicted)?;
    let flux = decoded
        .iter()
        .copied()
        .next()
        .ok_or_else(|| AppError::data_format("Regressor returned an empty prediction."))?;

    let as_of = table
        .index()
        .last()
        .copied()
        .ok_or_else(|| AppError::insufficient_data("Dataset is empty."))?;
    // The target row sits `horizon` rows after the row following the window.
    let valid_at = as_of + Duration::minutes(horizon as i64 + 1);

    let class = flare_class(flux);
    let alert = alert_description(&class);
    info!(flux, class = %class, "Forecast computed");

    Ok(Prediction {
        as_of,
        valid_at,
        flux,
        class,
        alert,
    })
}

fn read_source(config: &PipelineConfig, source: SourceKind) -> Result<String, AppError> {
    let path = config.source_path(source);
    read_json_file(&path)
}

fn read_json_file(path: &Path) -> Result<String, AppError> {
    if !path.is_file() {
        return Err(AppError::missing_artifact(format!(
            "Source file not found: '{}'. Run `sfp update` without --skip-download, or `sfp synth`.",
            path.display()
        )));
    }
    fs::read_to_string(path).map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::data::{SynthConfig, generate_telemetry, write_telemetry};
    use crate::error::ErrorKind;

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: root.join("datas"),
            model_dir: root.join("ai_model"),
            state_dir: root.join("state"),
            window: 30,
            horizon: 10,
            ..PipelineConfig::default()
        }
    }

    fn seed_sources(config: &PipelineConfig, minutes: usize) {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let synth = SynthConfig {
            minutes,
            ..SynthConfig::new(start, 11)
        };
        let t = generate_telemetry(&synth).unwrap();
        write_telemetry(&t, config).unwrap();
    }

    #[test]
    fn update_train_predict_offline() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_sources(&config, 400);

        let update = run_update(&config, false).unwrap();
        assert!(update.summary.created);
        assert!(update.summary.rows_after > 0);
        assert!(config.state_path().is_file());

        let again = run_update(&config, false).unwrap();
        assert!(!again.summary.created);
        assert_eq!(again.summary.rows_added(), 0);

        let trained = run_train(&config, 1e-3).unwrap();
        assert!(trained.windows > 0);
        assert!(config.model_path().is_file());
        assert!(trained.scaler_dir.join(format!("{}_x_scaler.json", config.scaler_prefix)).is_file());
        assert!(trained.report.train_mse.is_finite());
        assert!(!trained.feature_names.iter().any(|n| n == LONG_CHANNEL));

        let p = run_predict(&config).unwrap();
        assert!(p.flux > 0.0);
        assert_eq!(p.valid_at - p.as_of, Duration::minutes(11));
        assert_eq!(p.alert, alert_description(&p.class));
    }

    #[test]
    fn predict_uses_the_trained_horizon_not_the_current_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_sources(&config, 400);
        run_update(&config, false).unwrap();
        run_train(&config, 1e-3).unwrap();

        let later = PipelineConfig {
            horizon: PipelineConfig::default().horizon,
            ..config.clone()
        };
        assert_ne!(later.horizon, config.horizon);
        let p = run_predict(&later).unwrap();
        assert_eq!(p.valid_at - p.as_of, Duration::minutes(11));
    }

    #[test]
    fn failed_model_save_leaves_no_scalers_behind() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_sources(&config, 400);
        run_update(&config, false).unwrap();
        // A directory where the model file should go makes the save fail.
        fs::create_dir_all(config.model_path()).unwrap();

        let err = run_train(&config, 1e-3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!config.model_dir.join(format!("{}_x_scaler.json", config.scaler_prefix)).exists());
        assert!(!config.model_dir.join(format!("{}_y_scaler.json", config.scaler_prefix)).exists());
    }

    #[test]
    fn predict_without_artifacts_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_predict(&config_in(dir.path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
    }

    #[test]
    fn update_without_sources_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_update(&config_in(dir.path()), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
    }
}
