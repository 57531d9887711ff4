//! Synthetic GOES telemetry in the NOAA 7-day JSON layouts.
//!
//! Lets the whole update/train/predict loop run offline. The long channel
//! follows a slowly drifting quiet-sun level with log-normal noise and
//! occasional impulsive flares; the short channel tracks it with a harder
//! spectrum during flares. EUV lines respond weakly to flares, drop out for
//! whole minutes now and then, and carry eclipse-flagged samples.

use std::f64::consts::TAU;
use std::fs::{self, File};
use std::path::PathBuf;

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};
use serde_json::{Value, json};
use tracing::info;

use crate::domain::{LONG_CHANNEL, PipelineConfig, SourceKind};
use crate::error::AppError;

const SHORT_CHANNEL: &str = "0.05-0.4nm";
const SATELLITE: u32 = 18;

/// EUV lines (nm x 10) and their quiet irradiance.
const EUV_LINES: [(u32, f64); 4] = [(256, 3.1e-4), (284, 1.2e-4), (304, 8.5e-4), (1216, 6.2e-3)];

const QUIET_LEVEL: f64 = 3.0e-7;
const DRIFT_PERIOD_MIN: f64 = 3.0 * 1440.0;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub start: DateTime<Utc>,
    pub minutes: usize,
    pub seed: u64,
    /// Per-minute probability that a flare begins.
    pub flare_prob: f64,
    /// Per-minute probability that an EUV outage begins.
    pub outage_prob: f64,
    /// Per-sample probability of an eclipse flag on EUV.
    pub eclipse_prob: f64,
}

impl SynthConfig {
    pub fn new(start: DateTime<Utc>, seed: u64) -> Self {
        Self {
            start,
            minutes: 7 * 1440,
            seed,
            flare_prob: 0.002,
            outage_prob: 0.0008,
            eclipse_prob: 0.002,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthTelemetry {
    pub xray: Value,
    pub euv: Value,
    pub flares: usize,
}

#[derive(Debug, Clone, Copy)]
struct Flare {
    onset: usize,
    peak: f64,
    rise: f64,
    decay: f64,
}

impl Flare {
    fn flux(&self, minute: usize) -> f64 {
        let t = minute as f64 - self.onset as f64;
        if t < 0.0 {
            0.0
        } else if t < self.rise {
            self.peak * t / self.rise
        } else {
            self.peak * (-(t - self.rise) / self.decay).exp()
        }
    }

    fn finished(&self, minute: usize) -> bool {
        minute as f64 > self.onset as f64 + self.rise + 12.0 * self.decay
    }
}

pub fn generate_telemetry(config: &SynthConfig) -> Result<SynthTelemetry, AppError> {
    if config.minutes == 0 {
        return Err(AppError::config("Synthetic span must be at least one minute."));
    }
    for (name, p) in [
        ("flare", config.flare_prob),
        ("outage", config.outage_prob),
        ("eclipse", config.eclipse_prob),
    ] {
        if !(0.0..1.0).contains(&p) {
            return Err(AppError::config(format!("Invalid {name} probability {p}.")));
        }
    }

    let start = config
        .start
        .duration_trunc(Duration::minutes(1))
        .map_err(|e| AppError::config(format!("Invalid start time: {e}")))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = LogNormal::new(0.0, 0.06)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
    let euv_noise = Normal::new(1.0, 0.01)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
    let drift_phase = rng.gen_range(0.0..TAU);

    let mut active: Vec<Flare> = Vec::new();
    let mut flares = 0usize;
    let mut outage_left = 0usize;
    let mut xray = Vec::with_capacity(config.minutes * 2);
    let mut euv = Vec::with_capacity(config.minutes * EUV_LINES.len());

    for minute in 0..config.minutes {
        if rng.gen_bool(config.flare_prob) {
            // Peak drawn log-uniformly from B to low X class.
            let exponent = rng.gen_range(-6.5..-3.8);
            active.push(Flare {
                onset: minute,
                peak: 10f64.powf(exponent),
                rise: rng.gen_range(4.0..15.0),
                decay: rng.gen_range(10.0..45.0),
            });
            flares += 1;
        }
        active.retain(|f| !f.finished(minute));

        let drift = 0.25 * (TAU * minute as f64 / DRIFT_PERIOD_MIN + drift_phase).sin();
        let quiet = QUIET_LEVEL * 10f64.powf(drift);
        let flare: f64 = active.iter().map(|f| f.flux(minute)).sum();
        let long = (quiet + flare) * noise.sample(&mut rng);
        let hardness = 0.02 + 0.08 * flare / (quiet + flare);
        let short = long * hardness * noise.sample(&mut rng);

        let time_tag = (start + Duration::minutes(minute as i64))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        // Rare dropped readings show up as nulls in the feed.
        let long_value = (!rng.gen_bool(0.0005)).then_some(long);
        xray.push(json!({
            "time_tag": time_tag,
            "satellite": SATELLITE,
            "flux": long_value,
            "observed_flux": long_value,
            "electron_correction": 0.0,
            "electron_contaminaton": false,
            "energy": LONG_CHANNEL,
        }));
        xray.push(json!({
            "time_tag": time_tag,
            "satellite": SATELLITE,
            "flux": short,
            "observed_flux": short,
            "electron_correction": 0.0,
            "electron_contaminaton": false,
            "energy": SHORT_CHANNEL,
        }));

        if outage_left > 0 {
            outage_left -= 1;
            continue;
        }
        if rng.gen_bool(config.outage_prob) {
            outage_left = rng.gen_range(2..30);
            continue;
        }

        let eclipse = rng.gen_bool(config.eclipse_prob);
        let activity = flare / (quiet + flare);
        for (line, base) in EUV_LINES {
            let value = base * (1.0 + 0.3 * activity) * euv_noise.sample(&mut rng);
            euv.push(json!({
                "time_tag": time_tag,
                "satellite": SATELLITE,
                "line": line,
                "value": value,
                "flags": {
                    "eclipse": eclipse,
                    "lunar_transit": false,
                    "geocorona": false,
                },
            }));
        }
    }

    Ok(SynthTelemetry {
        xray: Value::Array(xray),
        euv: Value::Array(euv),
        flares,
    })
}

/// Write the synthetic feeds where the update step expects downloaded files.
pub fn write_telemetry(telemetry: &SynthTelemetry, config: &PipelineConfig) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(&config.data_dir)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", config.data_dir.display())))?;

    let mut written = Vec::new();
    for (source, body) in [(SourceKind::Xray, &telemetry.xray), (SourceKind::Euv, &telemetry.euv)] {
        let path = config.source_path(source);
        let file = File::create(&path)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, body)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
        info!(path = %path.display(), "Synthetic feed written");
        written.push(path);
    }
    Ok(written)
}
