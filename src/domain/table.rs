//! Time-indexed columnar table.
//!
//! Every stage of the feature pipeline exchanges a `TimeTable`: one row per
//! timestamp, one nullable `f64` column per measured channel. The constructor
//! enforces the one structural invariant the rest of the crate relies on:
//! the index is strictly increasing (sorted, no duplicate timestamps).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// A named nullable column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeTable {
    index: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl TimeTable {
    pub fn new(index: Vec<DateTime<Utc>>, columns: Vec<Column>) -> Result<Self, AppError> {
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(AppError::data_format(format!(
                "Time index is not strictly increasing at {} -> {}.",
                index[pos], index[pos + 1]
            )));
        }
        let mut table = Self {
            index,
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// A table with no rows but a known schema.
    pub fn empty(names: &[&str]) -> Self {
        Self {
            index: Vec::new(),
            columns: names.iter().map(|n| Column::new(*n, Vec::new())).collect(),
        }
    }

    /// Build a table from keyed rows; the map guarantees sorted unique keys.
    ///
    /// Rows shorter than `names` are padded with nulls.
    pub fn from_rows(names: Vec<String>, rows: BTreeMap<DateTime<Utc>, Vec<Option<f64>>>) -> Self {
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        let mut index = Vec::with_capacity(rows.len());
        for (ts, row) in rows {
            index.push(ts);
            for (j, column) in columns.iter_mut().enumerate() {
                column.values.push(row.get(j).copied().flatten());
            }
        }
        Self { index, columns }
    }

    /// Pivot long-format `(time, channel, value)` records into one column per channel.
    ///
    /// Duplicate `(time, channel)` cells are averaged over their non-null values.
    /// A timestamp that only carries null values still produces a (null) row.
    pub fn pivot<I>(records: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, String, Option<f64>)>,
    {
        let mut channels: Vec<String> = Vec::new();
        let mut channel_idx: HashMap<String, usize> = HashMap::new();
        let mut cells: BTreeMap<DateTime<Utc>, HashMap<usize, (f64, usize)>> = BTreeMap::new();

        for (ts, channel, value) in records {
            let idx = *channel_idx.entry(channel.clone()).or_insert_with(|| {
                channels.push(channel);
                channels.len() - 1
            });
            let row = cells.entry(ts).or_default();
            let cell = row.entry(idx).or_insert((0.0, 0));
            if let Some(v) = value.filter(|v| v.is_finite()) {
                cell.0 += v;
                cell.1 += 1;
            }
        }

        let order = channel_order(&channels);
        let names = order.iter().map(|&i| format!("{prefix}{}", channels[i])).collect();
        let rows = cells
            .into_iter()
            .map(|(ts, row)| {
                let values = order
                    .iter()
                    .map(|i| match row.get(i) {
                        Some(&(sum, n)) if n > 0 => Some(sum / n as f64),
                        _ => None,
                    })
                    .collect();
                (ts, values)
            })
            .collect();

        Self::from_rows(names, rows)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), AppError> {
        if column.values.len() != self.index.len() {
            return Err(AppError::data_format(format!(
                "Column `{}` has {} values for {} index rows.",
                column.name,
                column.values.len(),
                self.index.len()
            )));
        }
        if self.column(&column.name).is_some() {
            return Err(AppError::data_format(format!("Duplicate column `{}`.", column.name)));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove columns without a single non-null value; returns their names.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            let keep = c.values.iter().any(Option::is_some);
            if !keep {
                dropped.push(c.name.clone());
            }
            keep
        });
        dropped
    }

    /// Values of row `i` in column order.
    pub fn row(&self, i: usize) -> Vec<Option<f64>> {
        self.columns.iter().map(|c| c.values[i]).collect()
    }

    /// Keep only timestamps present in both tables; columns are `self`'s followed by `other`'s.
    pub fn inner_join(&self, other: &TimeTable) -> Result<TimeTable, AppError> {
        if let Some(clash) = other.columns.iter().find(|c| self.column(&c.name).is_some()) {
            return Err(AppError::data_format(format!(
                "Cannot join tables: column `{}` exists on both sides.",
                clash.name
            )));
        }

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.index.len() && j < other.index.len() {
            match self.index[i].cmp(&other.index[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    left_rows.push(i);
                    right_rows.push(j);
                    i += 1;
                    j += 1;
                }
            }
        }

        let index = left_rows.iter().map(|&i| self.index[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), left_rows.iter().map(|&i| c.values[i]).collect()))
            .chain(
                other
                    .columns
                    .iter()
                    .map(|c| Column::new(c.name.clone(), right_rows.iter().map(|&j| c.values[j]).collect())),
            )
            .collect();

        Ok(TimeTable { index, columns })
    }
}

/// Numeric order when every channel id parses as a number, lexicographic otherwise.
fn channel_order(channels: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..channels.len()).collect();
    let numeric: Option<Vec<f64>> = channels.iter().map(|c| c.trim().parse::<f64>().ok()).collect();
    match numeric {
        Some(keys) => order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b])),
        None => order.sort_by(|&a, &b| channels[a].cmp(&channels[b])),
    }
    order
}
