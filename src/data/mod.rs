//! Source data: live NOAA feeds and an offline synthetic stand-in.

pub mod noaa;
pub mod sample;

pub use noaa::NoaaClient;
pub use sample::{SynthConfig, SynthTelemetry, generate_telemetry, write_telemetry};
