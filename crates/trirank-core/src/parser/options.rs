//! Search-form dropdown parser
//!
//! The events search page embeds its dropdown option sets as JSON
//! documents in the `value` attributes of three hidden inputs:
//! `#YearsSource`, `#RaceTypesSource` and `#StatesSource`. These are
//! fetched once per crawl session and drive the search cross product.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{Result, TrirankError};
use crate::types::{DropdownOptions, RaceTypeOption, StateOption};

/// Parse the dropdown option sets from the events page HTML.
///
/// # Returns
/// * `Ok(DropdownOptions)` with years, race types and states in their
///   discovered order
/// * `Err(TrirankError::ElementNotFound)` when a source input is missing
/// * `Err(TrirankError::Decode)` when an embedded JSON document is malformed
pub fn parse_dropdown_options(html: &str) -> Result<DropdownOptions> {
    let document = Html::parse_document(html);

    let years = parse_years(&input_value(&document, "YearsSource")?)?;

    let race_types: Vec<RaceTypeOption> =
        serde_json::from_str(&input_value(&document, "RaceTypesSource")?)
            .map_err(|e| TrirankError::Decode(format!("RaceTypesSource: {}", e)))?;

    let states: Vec<StateOption> =
        serde_json::from_str(&input_value(&document, "StatesSource")?)
            .map_err(|e| TrirankError::Decode(format!("StatesSource: {}", e)))?;

    Ok(DropdownOptions {
        years,
        race_types,
        states,
    })
}

/// Read the `value` attribute of the element with the given id.
fn input_value(document: &Html, id: &str) -> Result<String> {
    let selector = Selector::parse(&format!("#{}", id))
        .map_err(|e| TrirankError::Decode(format!("invalid selector #{}: {:?}", id, e)))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| TrirankError::ElementNotFound(format!("#{}", id)))?;

    element
        .value()
        .attr("value")
        .map(str::to_string)
        .ok_or_else(|| TrirankError::ElementNotFound(format!("#{}[value]", id)))
}

/// Years are served either as bare numbers or as strings.
fn parse_years(json: &str) -> Result<Vec<i32>> {
    let values: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| TrirankError::Decode(format!("YearsSource: {}", e)))?;

    values
        .into_iter()
        .map(|v| match v {
            Value::Number(n) => n
                .as_i64()
                .map(|y| y as i32)
                .ok_or_else(|| TrirankError::Decode(format!("YearsSource: bad year {}", n))),
            Value::String(s) => s
                .parse::<i32>()
                .map_err(|_| TrirankError::Decode(format!("YearsSource: bad year '{}'", s))),
            other => Err(TrirankError::Decode(format!(
                "YearsSource: bad year {}",
                other
            ))),
        })
        .collect()
}
