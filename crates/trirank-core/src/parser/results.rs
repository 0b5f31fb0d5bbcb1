//! Race metadata and results decoders
//!
//! Race metadata arrives as a JSON envelope with the race object under
//! `Race`. The results endpoint double-encodes: its `Results` field is
//! a JSON string that itself holds the array of per-participant
//! records.

use serde_json::Value;

use crate::error::{Result, TrirankError};
use crate::types::{RaceData, Record};

/// Decode the race metadata envelope.
pub fn parse_race_data(body: &str, race_id: &str) -> Result<RaceData> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| TrirankError::Decode(format!("race data: {}", e)))?;

    let fields = envelope
        .get("Race")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| TrirankError::Decode("race data: missing Race object".to_string()))?;

    Ok(RaceData {
        race_id: race_id.to_string(),
        fields,
    })
}

/// Decode the double-encoded results table.
///
/// A missing, null or empty `Results` field is an empty table, not an
/// error; only malformed JSON is surfaced as `Decode`.
pub fn parse_race_results(body: &str) -> Result<Vec<Record>> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| TrirankError::Decode(format!("race results: {}", e)))?;

    let embedded = match envelope.get("Results") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(TrirankError::Decode(format!(
                "race results: Results is not a string: {}",
                other
            )))
        }
    };

    serde_json::from_str(&embedded)
        .map_err(|e| TrirankError::Decode(format!("race results table: {}", e)))
}
