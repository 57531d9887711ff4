//! Merge the per-source tables into one unified feature batch.

use tracing::{info, warn};

use crate::domain::TimeTable;
use crate::error::AppError;

/// Inner-join X-ray bands, background and EUV lines on timestamp.
///
/// Column order is X-ray bands, `x_ray_bg`, EUV lines, `euv_is_missing`. Sources
/// without a common timestamp produce an empty table (logged, not an error):
/// clock skew between feeds during a 7-day refresh is expected.
pub fn merge_sources(xray: &TimeTable, background: &TimeTable, euv: &TimeTable) -> Result<TimeTable, AppError> {
    let merged = xray.inner_join(background)?.inner_join(euv)?;

    if merged.is_empty() {
        warn!(
            xray_rows = xray.len(),
            background_rows = background.len(),
            euv_rows = euv.len(),
            "Sources share no common timestamps; merged batch is empty"
        );
    } else {
        info!(rows = merged.len(), columns = merged.columns().len(), "Sources merged");
    }
    Ok(merged)
}
