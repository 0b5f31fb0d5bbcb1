//! Event detail parser
//!
//! Extracts the race identifiers hosted by one event from its detail
//! page. Races are list items under `ul#racesList`, each carrying its
//! id in a `raceid` attribute.

use scraper::{Html, Selector};

use crate::error::{Result, TrirankError};

/// Parse the race identifiers from an event detail page.
///
/// An event page without a race list yields an empty vector; events
/// with no races exist and are not an error.
pub fn parse_race_ids(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    let selector = Selector::parse("ul#racesList > li.raceLink")
        .map_err(|e| TrirankError::Decode(format!("invalid selector: {:?}", e)))?;

    let mut race_ids = Vec::new();
    for li in document.select(&selector) {
        if let Some(race_id) = li.value().attr("raceid") {
            let race_id = race_id.trim();
            if !race_id.is_empty() {
                race_ids.push(race_id.to_string());
            }
        }
    }

    Ok(race_ids)
}
