//! Typed records of the raw NOAA JSON feeds.
//!
//! The feeds are arrays of flat objects with a few extra fields we ignore.
//! Required fields must be present; numeric readings may be `null`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// A channel identifier: X-ray `energy` is a band label, EUV `line` a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    Name(String),
    Id(serde_json::Number),
}

impl Channel {
    pub fn label(&self) -> String {
        match self {
            Channel::Name(s) => s.trim().to_string(),
            Channel::Id(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XrayRecord {
    #[serde(deserialize_with = "timestamp")]
    pub time_tag: DateTime<Utc>,
    pub energy: Channel,
    #[serde(deserialize_with = "reading")]
    pub observed_flux: Option<f64>,
}

/// Quality flags attached to every EUV sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EuvFlags {
    pub eclipse: bool,
    pub lunar_transit: bool,
    pub geocorona: bool,
}

impl EuvFlags {
    pub fn invalidates(self) -> bool {
        self.eclipse || self.lunar_transit || self.geocorona
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EuvRecord {
    #[serde(deserialize_with = "timestamp")]
    pub time_tag: DateTime<Utc>,
    pub line: Channel,
    #[serde(deserialize_with = "reading")]
    pub value: Option<f64>,
    pub flags: EuvFlags,
}

/// Parse a JSON array of feed records.
pub fn parse_records<T: DeserializeOwned>(raw: &str, source: &str) -> Result<Vec<T>, AppError> {
    serde_json::from_str::<Vec<T>>(raw).map_err(|e| AppError::data_format(format!("Invalid {source} JSON: {e}")))
}

/// Parse a UTC timestamp.
///
/// Accepts RFC3339 (`2025-01-01T00:00:00Z`, `+00:00` offsets) and naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    const FMTS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!("invalid timestamp '{s}'"))
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(D::Error::custom)
}

/// Present but nullable; non-finite numbers count as missing.
fn reading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::error::ErrorKind;

    #[test]
    fn timestamps_accept_noaa_and_csv_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 0).unwrap();
        for raw in [
            "2025-02-03T04:05:00Z",
            "2025-02-03T04:05:00+00:00",
            "2025-02-03 04:05:00+00:00",
            "2025-02-03 04:05:00",
            "2025-02-03T04:05:00",
        ] {
            assert_eq!(parse_timestamp(raw).unwrap(), expected, "{raw}");
        }
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn non_array_payload_is_a_format_error() {
        let err = parse_records::<XrayRecord>(r#"{"time_tag": "x"}"#, "X-ray").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn channel_ids_may_be_numbers_or_strings() {
        let raw = r#"[
            {"time_tag": "2025-03-01T00:00:00Z", "line": 304, "value": 1.0,
             "flags": {"eclipse": false, "lunar_transit": false, "geocorona": true}},
            {"time_tag": "2025-03-01T00:00:00Z", "line": "1216", "value": null,
             "flags": {"eclipse": false, "lunar_transit": false, "geocorona": false}}
        ]"#;
        let records = parse_records::<EuvRecord>(raw, "EUV").unwrap();
        assert_eq!(records[0].line.label(), "304");
        assert!(records[0].flags.invalidates());
        assert_eq!(records[1].line.label(), "1216");
        assert_eq!(records[1].value, None);
    }

    #[test]
    fn missing_reading_is_an_error_but_null_is_not() {
        let err = parse_records::<XrayRecord>(r#"[{"time_tag": "2025-03-01T00:00:00Z", "energy": "0.1-0.8nm"}]"#, "X-ray")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
        assert!(err.to_string().contains("observed_flux"));

        let ok = parse_records::<XrayRecord>(
            r#"[{"time_tag": "2025-03-01 00:00:00", "energy": "0.1-0.8nm", "observed_flux": null, "satellite": 18}]"#,
            "X-ray",
        )
        .unwrap();
        assert_eq!(ok[0].observed_flux, None);
        assert_eq!(ok[0].time_tag, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn bad_timestamp_names_the_value() {
        let err = parse_records::<XrayRecord>(
            r#"[{"time_tag": "soon", "energy": "0.1-0.8nm", "observed_flux": 1e-6}]"#,
            "X-ray",
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid timestamp 'soon'"));
    }
}
