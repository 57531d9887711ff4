//! Command-line parsing for the solar flare forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code; `app` turns parsed args into a `PipelineConfig`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_HORIZON, DEFAULT_WINDOW, PipelineConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sfp", version, about = "Solar X-ray flux forecaster (NOAA GOES)")]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the NOAA feeds, preprocess, and fold them into the stored dataset.
    Update(UpdateArgs),
    /// Build windows from the stored dataset, fit scalers and the regressor.
    Train(TrainArgs),
    /// Forecast flux and flare class from the most recent window.
    Predict,
    /// Print null/zero/duplicate counts for the stored dataset.
    Health,
    /// Write seeded synthetic X-ray and EUV feeds into the data dir.
    Synth(SynthArgs),
}

/// Where inputs and artifacts live.
#[derive(Debug, Args, Clone)]
pub struct PathArgs {
    /// Directory for downloaded feeds and the dataset CSV.
    #[arg(long, global = true, env = "SFP_DATA_DIR", default_value = "datas")]
    pub data_dir: PathBuf,

    /// Directory for the model artifact and scaler blobs.
    #[arg(long, global = true, env = "SFP_MODEL_DIR", default_value = "ai_model")]
    pub model_dir: PathBuf,

    /// Directory for `state.json`.
    #[arg(long, global = true, env = "SFP_STATE_DIR", default_value = "state")]
    pub state_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    /// Reuse JSON files already in the data dir instead of downloading.
    #[arg(long)]
    pub skip_download: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Input window length (rows / minutes).
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Forecast horizon (rows / minutes past the window end).
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Fraction of windows, from the end, held out for validation.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Ridge penalty for the linear regressor.
    #[arg(long, default_value_t = crate::models::DEFAULT_RIDGE)]
    pub ridge: f64,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First timestamp (RFC3339). Defaults to seven days before now.
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Number of one-minute samples.
    #[arg(long, default_value_t = 7 * 1440)]
    pub minutes: usize,
}

impl PathArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            model_dir: self.model_dir.clone(),
            state_dir: self.state_dir.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::parse_from(["sfp", "train"]);
        let config = cli.paths.to_config();
        assert_eq!(config.data_dir, PathBuf::from("datas"));
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.window, 180);
                assert_eq!(args.horizon, 90);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_paths_after_subcommand() {
        let cli = Cli::parse_from(["sfp", "update", "--skip-download", "--data-dir", "/tmp/x"]);
        assert_eq!(cli.paths.data_dir, PathBuf::from("/tmp/x"));
        assert!(matches!(cli.command, Command::Update(UpdateArgs { skip_download: true })));
    }

    #[test]
    fn synth_start_parses_rfc3339() {
        let cli = Cli::parse_from(["sfp", "synth", "--seed", "3", "--start", "2025-03-01T00:00:00Z"]);
        match cli.command {
            Command::Synth(args) => {
                assert_eq!(args.seed, 3);
                assert!(args.start.is_some());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
