//! GOES EUV spectral-line preprocessing.
//!
//! Produces a gap-free, exactly one-row-per-minute table of `euv_<line>` columns
//! plus the `euv_is_missing` indicator. Gap repair is three-tiered:
//!
//! 1. interior gaps of at most [`MAX_INTERPOLATED_GAP`] minutes are interpolated
//! 2. anything longer is frozen at the last known value (forward fill)
//! 3. leading rows with no prior value take the first known value (backward fill)
//!
//! Samples flagged as eclipse, lunar transit or geocoronal contamination are
//! physically invalid and are nulled before any of this happens.

use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::{info, warn};

use crate::domain::{Column, EUV_MISSING_COLUMN, EUV_PREFIX, TimeTable};
use crate::error::AppError;
use crate::features::records::{EuvRecord, parse_records};
use crate::math::{backward_fill, forward_fill, interpolate_short_gaps};

const SOURCE: &str = "EUV";

/// Longest run of missing minutes that is bridged by interpolation.
pub const MAX_INTERPOLATED_GAP: usize = 5;

pub fn preprocess_euv(raw_json: &str) -> Result<TimeTable, AppError> {
    let records: Vec<EuvRecord> = parse_records(raw_json, SOURCE)?;

    let mut masked = 0usize;
    let long: Vec<_> = records
        .into_iter()
        .map(|r| {
            let value = if r.flags.invalidates() {
                masked += 1;
                None
            } else {
                r.value
            };
            (r.time_tag, r.line.label(), value)
        })
        .collect();

    let mut pivoted = TimeTable::pivot(long, EUV_PREFIX);
    if pivoted.is_empty() {
        warn!("EUV feed contained no records");
        return Ok(TimeTable::empty(&[EUV_MISSING_COLUMN]));
    }
    let dropped = pivoted.drop_empty_columns();
    if !dropped.is_empty() {
        warn!(lines = ?dropped, "EUV lines with no valid sample in this batch were dropped");
    }

    let mut table = resample_minutely(&pivoted)?;
    let missing = missing_indicator(&table);
    let missing_rows = missing.iter().filter(|v| **v == Some(1.0)).count();

    repair_gaps(&mut table);
    table.push_column(Column::new(EUV_MISSING_COLUMN, missing))?;

    info!(
        rows = table.len(),
        lines = table.columns().len() - 1,
        masked,
        missing_rows,
        "EUV preprocessing complete"
    );
    Ok(table)
}

/// Reindex onto an exact one-minute grid from the first (floored) to the last timestamp.
///
/// Minutes absent from the source become all-null rows; samples that do not fall
/// exactly on a minute boundary are dropped.
pub fn resample_minutely(table: &TimeTable) -> Result<TimeTable, AppError> {
    let (Some(&first), Some(&last)) = (table.index().first(), table.index().last()) else {
        return Ok(table.clone());
    };
    let step = Duration::minutes(1);
    let start = first
        .duration_trunc(step)
        .map_err(|e| AppError::data_format(format!("Cannot align EUV index to minutes: {e}")))?;

    let mut grid: Vec<DateTime<Utc>> = Vec::new();
    let mut source_row: Vec<Option<usize>> = Vec::new();
    let mut cursor = 0usize;
    let mut ts = start;
    while ts <= last {
        while cursor < table.len() && table.index()[cursor] < ts {
            cursor += 1;
        }
        let hit = (cursor < table.len() && table.index()[cursor] == ts).then_some(cursor);
        grid.push(ts);
        source_row.push(hit);
        ts += step;
    }

    let columns = table
        .columns()
        .iter()
        .map(|c| {
            let values = source_row.iter().map(|row| row.and_then(|i| c.values[i])).collect();
            Column::new(c.name.clone(), values)
        })
        .collect();

    TimeTable::new(grid, columns)
}

/// 1.0 where every spectral column of the row is null, else 0.0.
fn missing_indicator(table: &TimeTable) -> Vec<Option<f64>> {
    (0..table.len())
        .map(|i| {
            let all_null = table.columns().iter().all(|c| c.values[i].is_none());
            Some(if all_null { 1.0 } else { 0.0 })
        })
        .collect()
}

fn repair_gaps(table: &mut TimeTable) {
    let index = table.index().to_vec();
    let names: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
    for name in names {
        if let Some(column) = table.column_mut(&name) {
            interpolate_short_gaps(&index, &mut column.values, MAX_INTERPOLATED_GAP);
            forward_fill(&mut column.values);
            backward_fill(&mut column.values);
        }
    }
}
