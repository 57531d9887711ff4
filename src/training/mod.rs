//! Dataset-to-tensor stage shared by training and inference.
//!
//! - sliding windows and horizon targets (`windows`)
//! - chronological train/test split (`split`)
//! - feature/target scaling with strict fit/transform separation (`scaler`)

pub mod scaler;
pub mod split;
pub mod windows;

pub use scaler::{FeatureScaler, FittedScaler, MinMaxParams, TARGET_FLOOR, TargetParams};
pub use split::{Split, chronological_split};
pub use windows::{TrainingSet, WindowSpec, build_training_windows, feature_columns, latest_window};
