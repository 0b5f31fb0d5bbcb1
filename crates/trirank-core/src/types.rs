//! Data types for the rankings crawler
//!
//! Events, races and result rows come back from the site with field
//! sets that vary by year and race type, so they are kept as ordered
//! field-name to value maps rather than fixed structs. Insertion order
//! is preserved (`serde_json` with `preserve_order`) because the CSV
//! header row is derived from it.

use serde::Deserialize;
use serde_json::Value;

/// A loosely-typed record: ordered mapping of field name to value.
pub type Record = serde_json::Map<String, Value>;

/// One (year, race type, country, state) search tuple.
///
/// Produced by the cross product of the discovered dropdown lists,
/// in their discovered order. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    /// Season year
    pub year: i32,
    /// Race type identifier as the site reports it
    pub race_type_id: String,
    /// Country identifier (e.g. "840" for the US)
    pub country_id: String,
    /// State identifier (e.g. "CA")
    pub state_id: String,
}

impl std::fmt::Display for SearchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.year, self.race_type_id, self.country_id, self.state_id
        )
    }
}

/// One race type entry from the search form dropdown.
#[derive(Debug, Clone, Deserialize)]
pub struct RaceTypeOption {
    /// Race type identifier used in search requests
    #[serde(rename = "RaceTypeId", deserialize_with = "de_string_or_number")]
    pub race_type_id: String,
    /// Human-readable race type name
    #[serde(rename = "Value", default)]
    pub value: String,
}

/// One state entry from the search form dropdown.
#[derive(Debug, Clone, Deserialize)]
pub struct StateOption {
    /// State identifier used in search requests
    #[serde(rename = "StateId", deserialize_with = "de_string_or_number")]
    pub state_id: String,
    /// Human-readable state name
    #[serde(rename = "StateName", default)]
    pub state_name: String,
    /// Country the state belongs to
    #[serde(rename = "CountryId", deserialize_with = "de_string_or_number")]
    pub country_id: String,
}

/// Dropdown option sets discovered once per crawl session.
#[derive(Debug, Clone, Default)]
pub struct DropdownOptions {
    /// Available season years
    pub years: Vec<i32>,
    /// Available race types
    pub race_types: Vec<RaceTypeOption>,
    /// Available states (each carrying its country id)
    pub states: Vec<StateOption>,
}

/// An event discovered by one search tuple.
///
/// `event_id` is required; everything else stays in the loose record.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event identifier within the originating search scope
    pub event_id: String,
    /// All fields as returned by the event search
    pub fields: Record,
}

impl Event {
    /// Build an event from a decoded record. Returns `None` when the
    /// record carries no usable `EventId`.
    pub fn from_record(fields: Record) -> Option<Self> {
        let event_id = field_str(&fields, "EventId")?;
        if event_id.is_empty() {
            return None;
        }
        Some(Self { event_id, fields })
    }
}

/// Metadata record for a single race.
#[derive(Debug, Clone)]
pub struct RaceData {
    /// Race identifier the metadata was fetched for
    pub race_id: String,
    /// All fields of the race object
    pub fields: Record,
}

impl RaceData {
    /// Whether a results table exists for this race.
    ///
    /// The site signals this with a non-empty `ResultsType` field.
    pub fn has_results(&self) -> bool {
        field_str(&self.fields, "ResultsType")
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Race type used for output path construction.
    pub fn race_type(&self) -> String {
        field_str(&self.fields, "RaceType")
            .or_else(|| field_str(&self.fields, "RaceTypeId"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Read a record field as a plain string.
///
/// Strings come back verbatim, numbers and booleans via their display
/// form. Null, absent and structured values yield `None`.
pub fn field_str(record: &Record, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Render any record value as a CSV cell.
///
/// Null becomes the empty placeholder; nested structures are kept as
/// compact JSON so no data is silently dropped.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Accept identifiers that the site serves either as JSON strings or
/// as bare numbers.
fn de_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
