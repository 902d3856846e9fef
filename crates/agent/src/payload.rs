//! Decoding of the inverter's realtime data payload.
//!
//! The `/api/realTimeData.htm` endpoint answers with a JSON-like document
//! whose `Data` array leaves unreported slots empty (`[1,,3]`). Empty slots
//! are filled with `0` before parsing, then the positional fields are read
//! using the inverter's 1-based numbering.

use serde::Deserialize;
use solax_core::types::Timestamp;
use solax_core::Sample;

use crate::error::SourceError;

/// 1-based positions in the `Data` array.
mod field {
    pub const GENERATION_POWER: usize = 7;
    pub const FEED_IN_POWER: usize = 11;
    pub const PV1_POWER: usize = 12;
    pub const PV2_POWER: usize = 13;
    pub const BATTERY_POWER: usize = 16;
    pub const BATTERY_CAPACITY: usize = 19;
}

#[derive(Debug, Deserialize)]
struct RealtimePayload {
    #[serde(rename = "Data")]
    data: Vec<serde_json::Value>,
}

/// Decode a realtime response body into a [`Sample`] stamped `timestamp`.
pub fn decode(body: &str, timestamp: Timestamp) -> Result<Sample, SourceError> {
    let filled = fill_empty_slots(body);
    let payload: RealtimePayload =
        serde_json::from_str(&filled).map_err(|e| SourceError::Parse(e.to_string()))?;

    let data = payload
        .data
        .iter()
        .map(numeric)
        .collect::<Result<Vec<f64>, _>>()?;

    // Positions past the end of the array are unreported, i.e. zero.
    let at = |position: usize| data.get(position - 1).copied().unwrap_or(0.0);

    Ok(Sample {
        timestamp,
        generation_watts: at(field::GENERATION_POWER),
        exported_watts: at(field::FEED_IN_POWER),
        battery_percentage: at(field::BATTERY_CAPACITY),
        battery_power_watts: at(field::BATTERY_POWER),
        pv1_power_watts: at(field::PV1_POWER),
        pv2_power_watts: at(field::PV2_POWER),
    })
}

/// Numbers pass through, numeric strings are parsed, `null` reads as zero.
fn numeric(value: &serde_json::Value) -> Result<f64, SourceError> {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| SourceError::Parse(format!("number out of range: {n}"))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| SourceError::Parse(format!("non-numeric data value: '{s}'"))),
        serde_json::Value::Null => Ok(0.0),
        other => Err(SourceError::Parse(format!("unexpected data value: {other}"))),
    }
}

/// Insert `0` into every empty array slot, outside string literals.
///
/// Handles runs (`,,,`), a leading gap (`[,`) and a trailing gap (`,]`).
fn fill_empty_slots(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    // Last non-whitespace character emitted outside a string.
    let mut previous: Option<char> = None;

    for c in body.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                previous = Some('"');
            }
            continue;
        }

        if (c == ',' || c == ']') && matches!(previous, Some(',')) {
            out.push('0');
        } else if c == ',' && matches!(previous, Some('[')) {
            out.push('0');
        }

        if c == '"' {
            in_string = true;
        }
        out.push(c);
        if !c.is_whitespace() {
            previous = Some(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    const CAPTURED: &str = r#"{"method":"uploadsn","version":"Solax_SI_CH_2nd_20170906_DE01","type":"AL_SI4","SN":"52A3AF07","Data":[0.8,0.7,254.1,437.7,2.5,241.1,549,35,19.7,10157.7,-831,217,344,,,,,,,,,,,,,,,,,,,,,,,,,,,,,1695.38,7303.79,,,,,,,,50.10,,,0.0,0.0,0,0.00,0,0,0,0.00,0,8,0,0,0.00,0,8],"Status":"2"}"#;

    fn ts() -> Timestamp {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn decodes_captured_payload() {
        let sample = decode(CAPTURED, ts()).unwrap();
        assert_eq!(sample.timestamp, ts());
        assert_eq!(sample.generation_watts, 549.0);
        assert_eq!(sample.exported_watts, -831.0);
        assert_eq!(sample.pv1_power_watts, 217.0);
        assert_eq!(sample.pv2_power_watts, 344.0);
        assert_eq!(sample.battery_power_watts, 0.0);
        assert_eq!(sample.battery_percentage, 0.0);
    }

    #[test]
    fn decodes_battery_fields() {
        let body = r#"{"Data":[0,0,0,0,0,0,1200,0,0,0,300,700,500,0,0,-250,0,0,87]}"#;
        let sample = decode(body, ts()).unwrap();
        assert_eq!(sample.battery_power_watts, -250.0);
        assert_eq!(sample.battery_percentage, 87.0);
        assert_eq!(sample.exported_watts, 300.0);
    }

    #[test]
    fn short_data_array_defaults_to_zero() {
        let sample = decode(r#"{"Data":[1,2,3]}"#, ts()).unwrap();
        assert_eq!(sample, Sample::zero(ts()));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let body = r#"{"Data":["1","2","3","4","5","6","  640 ","8","9","10","-75"]}"#;
        let sample = decode(body, ts()).unwrap();
        assert_eq!(sample.generation_watts, 640.0);
        assert_eq!(sample.exported_watts, -75.0);
    }

    #[test]
    fn fills_leading_trailing_and_repeated_gaps() {
        assert_eq!(fill_empty_slots("[,1,,,2,]"), "[0,1,0,0,2,0]");
        assert_eq!(fill_empty_slots("[ , 1 ,  , 2 ]"), "[ 0, 1 ,  0, 2 ]");
        assert_eq!(fill_empty_slots("[]"), "[]");
    }

    #[test]
    fn gaps_inside_strings_are_untouched() {
        let body = r#"{"note":"a,,b [,","Data":[,]}"#;
        assert_eq!(fill_empty_slots(body), r#"{"note":"a,,b [,","Data":[0,0]}"#);
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert_matches!(decode("<html>busy</html>", ts()), Err(SourceError::Parse(_)));
        assert_matches!(decode(r#"{"Status":"2"}"#, ts()), Err(SourceError::Parse(_)));
        assert_matches!(decode(r#"{"Data":[1,"x"]}"#, ts()), Err(SourceError::Parse(_)));
        assert!(decode("", ts()).unwrap_err().is_parse());
    }
}
