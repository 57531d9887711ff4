//! Feature pipeline: raw NOAA JSON to one unified, time-indexed batch.
//!
//! - X-ray pivot (`xray`)
//! - EUV masking, resampling and gap repair (`euv`)
//! - quiet-sun background estimation (`background`)
//! - timestamp inner join (`merge`)
//!
//! Everything here is pure data-in/data-out over already-read JSON text.

pub mod background;
pub mod euv;
pub mod merge;
pub mod records;
pub mod xray;

pub use background::estimate_background;
pub use euv::preprocess_euv;
pub use merge::merge_sources;
pub use xray::preprocess_xray;

use crate::domain::TimeTable;
use crate::error::AppError;

/// Run all preprocessors and merge their outputs.
pub fn build_batch(xray_json: &str, euv_json: &str) -> Result<TimeTable, AppError> {
    let xray = preprocess_xray(xray_json)?;
    let euv = preprocess_euv(euv_json)?;
    let background = estimate_background(&xray)?;
    merge_sources(&xray, &background, &euv)
}
