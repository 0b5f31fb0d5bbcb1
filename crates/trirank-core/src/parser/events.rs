//! Event list decoder
//!
//! The event search endpoint answers with a JSON array of loosely
//! shaped event objects. Field sets vary by year and race type, so
//! each entry is kept as an ordered record; only `EventId` is
//! required.

use crate::error::{Result, TrirankError};
use crate::types::{Event, Record};

/// Decode the JSON event list returned by the search endpoint.
///
/// Entries without a usable `EventId` cannot be descended into and are
/// skipped with a warning rather than failing the whole search tuple.
pub fn parse_event_list(body: &str) -> Result<Vec<Event>> {
    let records: Vec<Record> = serde_json::from_str(body)
        .map_err(|e| TrirankError::Decode(format!("event list: {}", e)))?;

    let mut events = Vec::with_capacity(records.len());
    for record in records {
        match Event::from_record(record) {
            Some(event) => events.push(event),
            None => tracing::warn!("event record without EventId skipped"),
        }
    }

    Ok(events)
}
