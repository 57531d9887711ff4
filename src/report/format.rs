//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays free of presentation details
//! - output changes are localized

use crate::app::pipeline::{Prediction, TrainOutcome, UpdateOutcome};
use crate::domain::PipelineConfig;
use crate::report::DatasetHealth;

pub fn format_update_summary(outcome: &UpdateOutcome) -> String {
    let mut out = String::new();

    out.push_str("=== sfp - dataset update ===\n");
    out.push_str(&format!(
        "Sources: {}\n",
        if outcome.downloaded { "downloaded from NOAA SWPC" } else { "local files" }
    ));
    out.push_str(&format!("Dataset: {}\n", outcome.dataset_path.display()));
    out.push_str(&format!("Batch rows: {}\n", outcome.summary.batch_rows));
    if outcome.summary.created {
        out.push_str(&format!("Created with {} rows\n", outcome.summary.rows_after));
    } else {
        out.push_str(&format!(
            "Rows: {} -> {} (+{})\n",
            outcome.summary.rows_before,
            outcome.summary.rows_after,
            outcome.summary.rows_added()
        ));
    }
    out.push_str(&format!(
        "Last update: {}\n",
        outcome.state.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out
}

pub fn format_training_summary(outcome: &TrainOutcome, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== sfp - training ===\n");
    out.push_str(&format!(
        "Window: {} min | horizon: {} min | test fraction: {:.2}\n",
        config.window, config.horizon, config.test_fraction
    ));
    out.push_str(&format!(
        "Windows: n={} (skipped {} with gaps)\n",
        outcome.windows, outcome.skipped
    ));
    out.push_str(&format!("Features ({}): {}\n", outcome.feature_names.len(), outcome.feature_names.join(", ")));

    let r = &outcome.report;
    out.push_str("\nScaled-target error:\n");
    out.push_str(&format!("{:<12} {:>8} {:>12} {:>12}\n", "split", "n", "MSE", "MAE"));
    out.push_str(&format!("{:-<12} {:-<8} {:-<12} {:-<12}\n", "", "", "", ""));
    out.push_str(&format!(
        "{:<12} {:>8} {:>12.6} {:>12.6}\n",
        "train", r.n_train, r.train_mse, r.train_mae
    ));
    out.push_str(&format!(
        "{:<12} {:>8} {:>12.6} {:>12.6}\n",
        "validation", r.n_validation, r.validation_mse, r.validation_mae
    ));

    out.push_str(&format!("\nModel: {}\n", outcome.model_path.display()));
    out.push_str(&format!("Scalers: {}\n", outcome.scaler_dir.display()));

    out
}

pub fn format_prediction(prediction: &Prediction) -> String {
    let mut out = String::new();

    out.push_str("=== sfp - forecast ===\n");
    out.push_str(&format!("Latest data: {}\n", prediction.as_of.format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!("Valid for:   {}\n", prediction.valid_at.format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!("Predicted X-ray flux: {:.3e} W/m^2\n", prediction.flux));
    out.push_str(&format!("Solar class: {}\n", prediction.class));
    out.push_str(&format!("Alert: {}\n", prediction.alert));

    out
}

pub fn format_health(health: &DatasetHealth) -> String {
    let mut out = String::new();

    out.push_str(&format!("Shape: ({}, {})\n", health.rows, health.columns));

    out.push_str("\nMissing values per column:\n");
    out.push_str(&format_counts(&health.null_counts));

    out.push_str("\nZero-value counts per column:\n");
    out.push_str(&format_counts(&health.zero_counts));

    out.push_str(&format!(
        "\nNumber of duplicated time_tag entries: {}\n",
        health.duplicated_time_tags
    ));

    out
}

fn format_counts(counts: &[(String, usize)]) -> String {
    let width = counts.iter().map(|(n, _)| n.len()).max().unwrap_or(0).max(8);
    counts
        .iter()
        .map(|(name, n)| format!("{name:<width$} {n:>8}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn prediction_mentions_class_and_alert() {
        let p = Prediction {
            as_of: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            valid_at: Utc.with_ymd_and_hms(2025, 3, 1, 13, 30, 0).unwrap(),
            flux: 2.3e-6,
            class: "C2.3".to_string(),
            alert: crate::report::alert_description("C2.3"),
        };
        let text = format_prediction(&p);
        assert!(text.contains("2.300e-6"));
        assert!(text.contains("Solar class: C2.3"));
        assert!(text.contains("Valid for:   2025-03-01 13:30 UTC"));
    }

    #[test]
    fn health_lists_every_column() {
        let health = DatasetHealth {
            rows: 3,
            columns: 3,
            null_counts: vec![("0.1-0.8nm".to_string(), 1), ("x_ray_bg".to_string(), 0)],
            zero_counts: vec![("0.1-0.8nm".to_string(), 0), ("x_ray_bg".to_string(), 2)],
            duplicated_time_tags: 0,
        };
        let text = format_health(&health);
        assert!(text.starts_with("Shape: (3, 3)"));
        assert_eq!(text.matches("x_ray_bg").count(), 2);
        assert!(text.contains("duplicated time_tag entries: 0"));
    }
}
