//! Shared domain types and naming conventions.
//!
//! Column names are part of the persisted CSV schema, so they live here rather
//! than inside the individual preprocessors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Row key of every table and first column of the persisted dataset.
pub const TIME_COLUMN: &str = "time_tag";

/// Long-wavelength GOES X-ray channel; also the forecast target.
pub const LONG_CHANNEL: &str = "0.1-0.8nm";

/// Quiet-sun background series derived from the long channel.
pub const BACKGROUND_COLUMN: &str = "x_ray_bg";

/// Prefix for pivoted EUV spectral-line columns (`euv_<line>`).
pub const EUV_PREFIX: &str = "euv_";

/// 1 when a whole EUV minute was absent/invalid before gap repair, else 0.
pub const EUV_MISSING_COLUMN: &str = "euv_is_missing";

pub const DEFAULT_WINDOW: usize = 180;
pub const DEFAULT_HORIZON: usize = 90;

/// NOAA SWPC GOES-primary 7-day feeds.
pub const XRAY_URL: &str = "https://services.swpc.noaa.gov/json/goes/primary/xrays-7-day.json";
pub const EUV_URL: &str = "https://services.swpc.noaa.gov/json/goes/primary/euvs-7-day.json";
pub const XRAY_BACKGROUND_URL: &str =
    "https://services.swpc.noaa.gov/json/goes/primary/xray-background-7-day.json";

/// Which NOAA feed a raw JSON file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Xray,
    Euv,
    XrayBackground,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Xray, SourceKind::Euv, SourceKind::XrayBackground];

    pub fn url(self) -> &'static str {
        match self {
            SourceKind::Xray => XRAY_URL,
            SourceKind::Euv => EUV_URL,
            SourceKind::XrayBackground => XRAY_BACKGROUND_URL,
        }
    }

    /// File name under the data directory (last URL path segment).
    pub fn file_name(self) -> &'static str {
        let url = self.url();
        url.rsplit('/').next().unwrap_or(url)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment overrides and defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub state_dir: PathBuf,
    pub dataset_name: String,
    pub model_name: String,
    /// Scaler blobs are written as `<prefix>_x_scaler.json` / `<prefix>_y_scaler.json`.
    pub scaler_prefix: String,

    pub window: usize,
    pub horizon: usize,
    /// Fraction of windows (taken from the end) held out for validation.
    pub test_fraction: f64,
}

impl PipelineConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.dataset_name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_name)
    }

    pub fn source_path(&self, source: SourceKind) -> PathBuf {
        self.data_dir.join(source.file_name())
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("datas"),
            model_dir: PathBuf::from("ai_model"),
            state_dir: PathBuf::from("state"),
            dataset_name: "sfp_dataset.csv".to_string(),
            model_name: "sfp_linear.json".to_string(),
            scaler_prefix: "solar".to_string(),
            window: DEFAULT_WINDOW,
            horizon: DEFAULT_HORIZON,
            test_fraction: 0.2,
        }
    }
}
