//! Quiet-sun X-ray background estimation.
//!
//! Follows the NOAA background recipe on the long-wavelength channel with three
//! cascaded trailing windows (row counts at one-minute cadence):
//!
//! - despike: rolling median over 60 samples (removes microflares and noise)
//! - floor: rolling minimum over 1440 samples (lowest level of the trailing day)
//! - smooth: rolling mean over 180 samples (removes the steps a rolling minimum makes)
//!
//! Every window is trailing so the estimate at `t` never depends on data after `t`.

use tracing::info;

use crate::domain::{BACKGROUND_COLUMN, Column, LONG_CHANNEL, TimeTable};
use crate::error::AppError;
use crate::math::{rolling_mean, rolling_median, rolling_min};

pub const DESPIKE_WINDOW: usize = 60;
pub const FLOOR_WINDOW: usize = 1440;
pub const SMOOTH_WINDOW: usize = 180;

/// Derive the `x_ray_bg` series from a preprocessed X-ray table.
///
/// The result shares the input's index and holds a single column.
pub fn estimate_background(xray: &TimeTable) -> Result<TimeTable, AppError> {
    let long = xray.column(LONG_CHANNEL).ok_or_else(|| {
        AppError::data_format(format!(
            "X-ray table has no `{LONG_CHANNEL}` channel; found {:?}.",
            xray.column_names()
        ))
    })?;

    let despiked = rolling_median(&long.values, DESPIKE_WINDOW);
    let floor = rolling_min(&despiked, FLOOR_WINDOW);
    let smooth = rolling_mean(&floor, SMOOTH_WINDOW);

    let table = TimeTable::new(xray.index().to_vec(), vec![Column::new(BACKGROUND_COLUMN, smooth)])?;
    info!(rows = table.len(), "X-ray background estimated");
    Ok(table)
}
