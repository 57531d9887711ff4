//! Reporting utilities: flare classes, dataset health, and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::HashMap;

use crate::io::RawDataset;

/// NOAA class letters and the flux (W/m^2) their magnitude is measured in.
const CLASS_SCALE: [(char, f64); 5] = [('X', 1e-4), ('M', 1e-5), ('C', 1e-6), ('B', 1e-7), ('A', 1e-7)];

/// NOAA class string for a long-channel flux, e.g. `2.3e-6 -> "C2.3"`.
///
/// Letters change at 1e-7 (B), 1e-6 (C), 1e-5 (M) and 1e-4 (X). A-class
/// magnitudes are quoted against the B threshold, so `5e-8 -> "A0.5"`.
pub fn flare_class(flux: f64) -> String {
    let flux = if flux.is_nan() { 0.0 } else { flux.max(0.0) };
    let (letter, unit) = CLASS_SCALE
        .iter()
        .copied()
        .find(|&(letter, unit)| letter == 'A' || flux >= unit)
        .unwrap_or(('A', 1e-7));
    format!("{letter}{:.1}", flux / unit)
}

/// Space-weather impact text for a class string (only the letter matters).
pub fn alert_description(class: &str) -> &'static str {
    match class.chars().next() {
        Some('A') => "Quiet Sun conditions. No impact on Earth.",
        Some('B') => "Background solar activity. Normal space weather.",
        Some('C') => "Minor flare. Possible weak radio disturbances near the poles.",
        Some('M') => {
            "Moderate flare. Possible radio blackouts (R1-R2) on the sunlit side of Earth. \
             Potential geomagnetic storms if associated with a CME."
        }
        Some('X') => {
            "Extreme flare! Strong global radio blackouts (R3-R5). \
             High risk for satellites, GPS systems, and terrestrial power grids."
        }
        _ => "Unknown flare class.",
    }
}

/// Stored-dataset sanity counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetHealth {
    pub rows: usize,
    /// Including `time_tag`.
    pub columns: usize,
    pub null_counts: Vec<(String, usize)>,
    pub zero_counts: Vec<(String, usize)>,
    /// Rows whose `time_tag` occurs more than once (every occurrence counted).
    pub duplicated_time_tags: usize,
}

pub fn dataset_health(raw: &RawDataset) -> DatasetHealth {
    let n_cols = raw.names.len();
    let mut nulls = vec![0usize; n_cols];
    let mut zeros = vec![0usize; n_cols];
    let mut seen: HashMap<_, usize> = HashMap::new();

    for (ts, values) in &raw.rows {
        *seen.entry(*ts).or_default() += 1;
        for (j, v) in values.iter().enumerate().take(n_cols) {
            match v {
                None => nulls[j] += 1,
                Some(x) if *x == 0.0 => zeros[j] += 1,
                Some(_) => {}
            }
        }
    }

    let label = |counts: Vec<usize>| -> Vec<(String, usize)> {
        raw.names.iter().cloned().zip(counts).collect()
    };

    DatasetHealth {
        rows: raw.rows.len(),
        columns: n_cols + 1,
        null_counts: label(nulls),
        zero_counts: label(zeros),
        duplicated_time_tags: seen.values().filter(|&&c| c > 1).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn class_boundaries() {
        assert_eq!(flare_class(9.9e-5), "M9.9");
        assert_eq!(flare_class(1.0e-4), "X1.0");
        assert_eq!(flare_class(5.0e-8), "A0.5");
        assert_eq!(flare_class(1.0e-7), "B1.0");
        assert_eq!(flare_class(2.3e-6), "C2.3");
        assert_eq!(flare_class(3.2e-3), "X32.0");
    }

    #[test]
    fn nonsense_flux_is_quiet() {
        assert_eq!(flare_class(f64::NAN), "A0.0");
        assert_eq!(flare_class(-1.0), "A0.0");
    }

    #[test]
    fn alert_text_follows_letter() {
        assert!(alert_description("X2.1").starts_with("Extreme"));
        assert!(alert_description("M1.0").contains("R1-R2"));
        assert_eq!(alert_description(""), "Unknown flare class.");
    }

    #[test]
    fn health_counts() {
        let t = |m| Utc.with_ymd_and_hms(2025, 3, 1, 0, m, 0).unwrap();
        let raw = RawDataset {
            names: vec!["a".to_string(), "b".to_string()],
            rows: vec![
                (t(0), vec![Some(0.0), None]),
                (t(1), vec![Some(1.0), None]),
                (t(1), vec![Some(0.0), Some(2.0)]),
                (t(2), vec![None, Some(0.0)]),
            ],
        };
        let health = dataset_health(&raw);
        assert_eq!(health.rows, 4);
        assert_eq!(health.columns, 3);
        assert_eq!(health.null_counts, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(health.zero_counts, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert_eq!(health.duplicated_time_tags, 2);
    }
}
