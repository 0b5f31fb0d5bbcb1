//! Rankings site operations
//!
//! This module provides the five logical remote operations the
//! traversal engine consumes. Each operation pairs a canonical request
//! key with the actual network call and a decoder, and resolves
//! through the read-through [`CachedFetcher`], so repeated requests
//! within the retention window never touch the network twice.

use serde_json::json;

use crate::error::{Result, TrirankError};
use crate::fetch::CachedFetcher;
use crate::parser::{
    parse_dropdown_options, parse_event_list, parse_race_data, parse_race_ids,
    parse_race_results,
};
use crate::types::{DropdownOptions, Event, RaceData, Record, SearchKey};

/// High-level API over the rankings site.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use trirank_core::{
///     CacheConfig, CachedFetcher, HttpCache, MemoryBackend, RankingsClient, RankingsScraper,
/// };
///
/// # async fn example() -> Result<(), trirank_core::TrirankError> {
/// let client = RankingsClient::new()?;
/// let cache = HttpCache::new(Arc::new(MemoryBackend::new()), CacheConfig::default());
/// let scraper = RankingsScraper::new(CachedFetcher::new(client, cache));
///
/// let options = scraper.dropdown_options().await?;
/// println!("{} years discovered", options.years.len());
/// # Ok(())
/// # }
/// ```
pub struct RankingsScraper {
    fetcher: CachedFetcher,
}

impl RankingsScraper {
    /// Create a scraper over the given fetcher.
    pub fn new(fetcher: CachedFetcher) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &CachedFetcher {
        &self.fetcher
    }

    fn base_url(&self) -> &str {
        self.fetcher.client().base_url()
    }

    /// Fetch the search-form dropdown option sets.
    ///
    /// Discovered once per crawl session; years, race types and states
    /// come back in the order the site lists them.
    pub async fn dropdown_options(&self) -> Result<DropdownOptions> {
        let key = keys::dropdowns(self.base_url());
        let client = self.fetcher.client();

        self.fetcher
            .fetch_with(&key, || client.get("/Event/Events"), parse_dropdown_options)
            .await
    }

    /// Search events for one (year, race type, country, state) tuple.
    pub async fn search_events(&self, search: &SearchKey) -> Result<Vec<Event>> {
        let key = keys::event_list(self.base_url(), search);
        let payload = json!({
            "Year": search.year,
            "ShowSanctioned": null,
            "RaceTypeId": search.race_type_id,
            "CountryId": search.country_id,
            "StateId": search.state_id,
            "SearchCriteria": ""
        });
        let client = self.fetcher.client();

        self.fetcher
            .fetch_with(
                &key,
                || client.post_json("/Event/List", &payload),
                parse_event_list,
            )
            .await
    }

    /// List the races hosted by an event.
    ///
    /// # Errors
    /// * `TrirankError::InvalidId` if `event_id` is empty
    pub async fn races_at_event(&self, event_id: &str) -> Result<Vec<String>> {
        if event_id.is_empty() {
            return Err(TrirankError::InvalidId(event_id.to_string()));
        }

        let key = keys::event_races(self.base_url(), event_id);
        let path = format!("/Event/ViewEvent/{}", event_id);
        let client = self.fetcher.client();

        self.fetcher
            .fetch_with(&key, || client.get(&path), parse_race_ids)
            .await
    }

    /// Fetch the metadata record for one race.
    ///
    /// # Errors
    /// * `TrirankError::InvalidId` if `race_id` is empty
    pub async fn race_data(&self, race_id: &str) -> Result<RaceData> {
        if race_id.is_empty() {
            return Err(TrirankError::InvalidId(race_id.to_string()));
        }

        let key = keys::race_data(self.base_url(), race_id);
        let payload = json!({ "RaceId": race_id });
        let client = self.fetcher.client();

        self.fetcher
            .fetch_with(
                &key,
                || client.post_json("/Race/GetRaceData/", &payload),
                |body| parse_race_data(body, race_id),
            )
            .await
    }

    /// Fetch the results table for one race.
    ///
    /// Callers are expected to check `RaceData::has_results` first; a
    /// race without a results table decodes as an empty vector.
    ///
    /// # Errors
    /// * `TrirankError::InvalidId` if `race_id` is empty
    pub async fn race_results(&self, race_id: &str) -> Result<Vec<Record>> {
        if race_id.is_empty() {
            return Err(TrirankError::InvalidId(race_id.to_string()));
        }

        let key = keys::race_results(self.base_url(), race_id);
        let payload = json!({
            "RaceId": race_id,
            "DivisionId": "",
            "Gender": "",
            "Category": "",
            "AllowCaching": false,
            "FirstName": ""
        });
        let client = self.fetcher.client();

        self.fetcher
            .fetch_with(
                &key,
                || client.post_json("/RaceResult/GetResults/", &payload),
                parse_race_results,
            )
            .await
    }
}

/// Canonical request keys.
///
/// Each key deterministically encodes the endpoint identity and every
/// parameter that affects the response; identical requests always map
/// to identical keys, distinct requests never collide.
pub mod keys {
    use crate::types::SearchKey;

    /// Key for the dropdown discovery page.
    pub fn dropdowns(base_url: &str) -> String {
        format!("{}/Event/Events", base_url)
    }

    /// Key for one event search tuple.
    pub fn event_list(base_url: &str, search: &SearchKey) -> String {
        format!(
            "{}/Event/List/{}/{}/{}/{}/",
            base_url, search.year, search.race_type_id, search.country_id, search.state_id
        )
    }

    /// Key for an event detail page.
    pub fn event_races(base_url: &str, event_id: &str) -> String {
        format!("{}/Event/ViewEvent/{}", base_url, event_id)
    }

    /// Key for one race's metadata.
    pub fn race_data(base_url: &str, race_id: &str) -> String {
        format!("{}/Race/GetRaceData/{}", base_url, race_id)
    }

    /// Key for one race's results table.
    pub fn race_results(base_url: &str, race_id: &str) -> String {
        format!("{}/RaceResult/GetResults/{}", base_url, race_id)
    }
}
