//! Persisted unified dataset (CSV).
//!
//! The on-disk file is the single growing history of merged feature rows:
//! header `time_tag,<bands...>,x_ray_bg,euv_<line>...,euv_is_missing`, one row
//! per minute, sorted ascending, no duplicate timestamps.
//!
//! Updates are computed fully in memory and then swapped in with a rename, so a
//! failed run never leaves a half-written dataset behind.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{TIME_COLUMN, TimeTable};
use crate::error::AppError;
use crate::features::records::parse_timestamp;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Rows exactly as stored, before any dedup/sort (used for health checks).
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub names: Vec<String>,
    pub rows: Vec<(DateTime<Utc>, Vec<Option<f64>>)>,
}

/// What an update did to the persisted dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub created: bool,
    pub batch_rows: usize,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl UpdateSummary {
    pub fn rows_added(&self) -> usize {
        self.rows_after.saturating_sub(self.rows_before)
    }
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the dataset, or `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<TimeTable>, AppError> {
        if !self.exists() {
            return Ok(None);
        }
        let raw = self.load_raw()?;
        let n_raw = raw.rows.len();
        let rows: BTreeMap<_, _> = raw.rows.into_iter().collect();
        if rows.len() != n_raw {
            warn!(
                path = %self.path.display(),
                duplicates = n_raw - rows.len(),
                "Dataset contains duplicate timestamps; keeping the last occurrence"
            );
        }
        Ok(Some(TimeTable::from_rows(raw.names, rows)))
    }

    /// Load the dataset, failing when it does not exist.
    pub fn load_required(&self) -> Result<TimeTable, AppError> {
        self.load()?.ok_or_else(|| {
            AppError::missing_artifact(format!(
                "Dataset not found: '{}'. Run `sfp update` first.",
                self.path.display()
            ))
        })
    }

    pub fn load_raw(&self) -> Result<RawDataset, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::io(format!("Failed to open dataset '{}': {e}", self.path.display()))
        })?;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| AppError::data_format(format!("Failed to read dataset header: {e}")))?
            .clone();
        let mut header_iter = headers.iter().map(|h| h.trim_start_matches('\u{feff}'));
        if header_iter.next() != Some(TIME_COLUMN) {
            return Err(AppError::data_format(format!(
                "Dataset '{}' must start with a `{TIME_COLUMN}` column.",
                self.path.display()
            )));
        }
        let names: Vec<String> = header_iter.map(str::to_string).collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // +2: 1-based lines, plus the header line.
            let line = idx + 2;
            let record = result.map_err(|e| AppError::data_format(format!("Dataset line {line}: {e}")))?;
            let ts = parse_timestamp(record.get(0).unwrap_or_default())
                .map_err(|e| AppError::data_format(format!("Dataset line {line}: {e}")))?;
            let values = (1..=names.len())
                .map(|j| parse_cell(record.get(j).unwrap_or_default()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::data_format(format!("Dataset line {line}: {e}")))?;
            rows.push((ts, values));
        }

        Ok(RawDataset { names, rows })
    }

    /// Fold a freshly merged batch into the persisted dataset.
    ///
    /// Re-applying the same batch is a no-op: the result is byte-identical.
    pub fn update(&self, batch: &TimeTable) -> Result<UpdateSummary, AppError> {
        let (merged, summary) = match self.load()? {
            None => {
                info!(path = %self.path.display(), rows = batch.len(), "Dataset not found; creating file");
                let summary = UpdateSummary {
                    created: true,
                    batch_rows: batch.len(),
                    rows_before: 0,
                    rows_after: batch.len(),
                };
                (batch.clone(), summary)
            }
            Some(existing) => {
                let merged = reconcile(&existing, batch);
                let summary = UpdateSummary {
                    created: false,
                    batch_rows: batch.len(),
                    rows_before: existing.len(),
                    rows_after: merged.len(),
                };
                info!(
                    path = %self.path.display(),
                    added = summary.rows_added(),
                    total = summary.rows_after,
                    "Dataset found; records updated"
                );
                (merged, summary)
            }
        };

        self.save(&merged)?;
        Ok(summary)
    }

    /// Overwrite the dataset file with `table` (write to a sibling temp file, then rename).
    pub fn save(&self, table: &TimeTable) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
        }

        let tmp = self.path.with_extension("csv.tmp");
        write_csv(&tmp, table)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::io(format!("Failed to replace dataset '{}': {e}", self.path.display()))
        })
    }
}

/// Concatenate `existing` and `batch`, keep the batch's row for duplicate
/// timestamps, and sort ascending.
///
/// Columns are the union: existing order first, then columns only the batch has.
/// Cells a row's source table did not carry are null.
pub fn reconcile(existing: &TimeTable, batch: &TimeTable) -> TimeTable {
    let mut names: Vec<String> = existing.column_names().iter().map(|s| s.to_string()).collect();
    for name in batch.column_names() {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    let positions = |table: &TimeTable| -> Vec<usize> {
        table
            .column_names()
            .iter()
            .map(|name| names.iter().position(|n| n == name).unwrap_or_default())
            .collect()
    };

    let mut rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();
    for table in [existing, batch] {
        let slots = positions(table);
        for (i, ts) in table.index().iter().enumerate() {
            let mut row = vec![None; names.len()];
            for (value, &slot) in table.row(i).into_iter().zip(&slots) {
                row[slot] = value;
            }
            rows.insert(*ts, row);
        }
    }

    TimeTable::from_rows(names, rows)
}

fn write_csv(path: &Path, table: &TimeTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;

    let mut header = vec![TIME_COLUMN];
    header.extend(table.column_names());
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write dataset header: {e}")))?;

    for (i, ts) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(table.columns().len() + 1);
        record.push(ts.format(TIME_FORMAT).to_string());
        record.extend(
            table
                .columns()
                .iter()
                .map(|c| c.values[i].map(|v| v.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .map_err(|e| AppError::io(format!("Failed to write dataset row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush dataset '{}': {e}", path.display())))
}

fn parse_cell(raw: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v = raw.parse::<f64>().map_err(|_| format!("invalid number '{raw}'"))?;
    Ok(v.is_finite().then_some(v))
}
