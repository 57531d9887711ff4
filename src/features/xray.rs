//! GOES X-ray flux preprocessing.
//!
//! Pivots the long-format feed (`time_tag`, `energy`, `observed_flux`) into one
//! column per energy band at the feed's native cadence. No gap repair happens
//! here; missing minutes are dropped later by the inner merge.

use tracing::info;

use crate::domain::TimeTable;
use crate::error::AppError;
use crate::features::records::{XrayRecord, parse_records};

const SOURCE: &str = "X-ray";

pub fn preprocess_xray(raw_json: &str) -> Result<TimeTable, AppError> {
    let records: Vec<XrayRecord> = parse_records(raw_json, SOURCE)?;

    let long = records
        .into_iter()
        .map(|r| (r.time_tag, r.energy.label(), r.observed_flux));
    let table = TimeTable::pivot(long, "");
    info!(
        rows = table.len(),
        bands = ?table.column_names(),
        "X-ray 7-day data preprocessed"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LONG_CHANNEL;
    use crate::error::ErrorKind;

    const SAMPLE: &str = r#"[
        {"time_tag": "2025-03-01T00:01:00Z", "satellite": 18, "energy": "0.1-0.8nm", "observed_flux": 2.0e-6},
        {"time_tag": "2025-03-01T00:00:00Z", "satellite": 18, "energy": "0.05-0.4nm", "observed_flux": 1.0e-8},
        {"time_tag": "2025-03-01T00:00:00Z", "satellite": 18, "energy": "0.1-0.8nm", "observed_flux": 1.0e-6},
        {"time_tag": "2025-03-01T00:01:00Z", "satellite": 18, "energy": "0.05-0.4nm", "observed_flux": 3.0e-8}
    ]"#;

    #[test]
    fn pivots_energy_bands_into_sorted_rows() {
        let table = preprocess_xray(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["0.05-0.4nm", LONG_CHANNEL]);
        assert_eq!(table.column(LONG_CHANNEL).unwrap().values, vec![Some(1.0e-6), Some(2.0e-6)]);
    }

    #[test]
    fn missing_flux_field_is_a_format_error() {
        let raw = r#"[{"time_tag": "2025-03-01T00:00:00Z", "energy": "0.1-0.8nm"}]"#;
        let err = preprocess_xray(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn null_flux_keeps_the_row_with_an_empty_cell() {
        let raw = r#"[
            {"time_tag": "2025-03-01T00:00:00Z", "energy": "0.1-0.8nm", "observed_flux": null},
            {"time_tag": "2025-03-01T00:01:00Z", "energy": "0.1-0.8nm", "observed_flux": 4.0e-7}
        ]"#;
        let table = preprocess_xray(raw).unwrap();
        assert_eq!(table.column(LONG_CHANNEL).unwrap().values, vec![None, Some(4.0e-7)]);
    }

    #[test]
    fn wrongly_typed_flux_is_a_format_error() {
        let raw = r#"[{"time_tag": "2025-03-01T00:00:00Z", "energy": "0.1-0.8nm", "observed_flux": "high"}]"#;
        assert_eq!(preprocess_xray(raw).unwrap_err().kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let err = preprocess_xray("[{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }
}
