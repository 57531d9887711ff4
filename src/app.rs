//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the requested pipeline step
//! - prints the report to stdout

use chrono::{Duration, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, SynthArgs, TrainArgs, UpdateArgs};
use crate::domain::PipelineConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sfp` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = cli.paths.to_config();

    match cli.command {
        Command::Update(args) => handle_update(&config, args),
        Command::Train(args) => handle_train(config, args),
        Command::Predict => handle_predict(&config),
        Command::Health => handle_health(&config),
        Command::Synth(args) => handle_synth(&config, args),
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn handle_update(config: &PipelineConfig, args: UpdateArgs) -> Result<(), AppError> {
    let outcome = pipeline::run_update(config, !args.skip_download)?;
    println!("{}", crate::report::format_update_summary(&outcome));
    Ok(())
}

fn handle_train(mut config: PipelineConfig, args: TrainArgs) -> Result<(), AppError> {
    config.window = args.window;
    config.horizon = args.horizon;
    config.test_fraction = args.test_fraction;

    let outcome = pipeline::run_train(&config, args.ridge)?;
    println!("{}", crate::report::format_training_summary(&outcome, &config));
    Ok(())
}

fn handle_predict(config: &PipelineConfig) -> Result<(), AppError> {
    let prediction = pipeline::run_predict(config)?;
    println!("{}", crate::report::format_prediction(&prediction));
    Ok(())
}

fn handle_health(config: &PipelineConfig) -> Result<(), AppError> {
    let store = crate::io::DatasetStore::new(config.dataset_path());
    if !store.exists() {
        return Err(AppError::missing_artifact(format!(
            "Dataset not found: '{}'. Run `sfp update` first.",
            store.path().display()
        )));
    }
    let health = crate::report::dataset_health(&store.load_raw()?);
    println!("{}", crate::report::format_health(&health));
    Ok(())
}

fn handle_synth(config: &PipelineConfig, args: SynthArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(|| Utc::now() - Duration::days(7));
    let synth = crate::data::SynthConfig {
        minutes: args.minutes,
        ..crate::data::SynthConfig::new(start, args.seed)
    };
    let telemetry = crate::data::generate_telemetry(&synth)?;
    let written = crate::data::write_telemetry(&telemetry, config)?;

    println!("Synthetic feeds (seed {}, {} flares):", args.seed, telemetry.flares);
    for path in written {
        println!("- {}", path.display());
    }
    Ok(())
}
