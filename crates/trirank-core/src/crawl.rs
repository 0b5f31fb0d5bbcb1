//! Depth-first traversal engine
//!
//! Drives the nested enumeration: search tuples, events, races, race
//! metadata and, when present, race results. One event's race tree is
//! fully resolved before the next event, and one search tuple before
//! the next tuple. Every resolved entity goes straight to the output
//! writer; no entity survives in memory across iterations.
//!
//! Error policy follows the cost of retrying: dropdown discovery and
//! event search failures are fatal (nothing downstream can proceed),
//! while a failure below an event abandons only that branch and the
//! crawl continues with its siblings.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::output::{CsvExporter, EVENT_FILE, RACE_FILE, RESULTS_FILE};
use crate::scraper::RankingsScraper;
use crate::types::{DropdownOptions, Event, SearchKey};

/// Options controlling one crawl run.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Restrict the crawl to a single year; `None` walks every
    /// discovered year.
    pub year: Option<i32>,
}

/// Counters accumulated over one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Search tuples enumerated
    pub search_tuples: u64,
    /// Event records written
    pub events: u64,
    /// Race metadata records written
    pub races: u64,
    /// Results tables written
    pub results: u64,
    /// Races skipped because no results table exists
    pub races_without_results: u64,
    /// Branches abandoned after an error
    pub branch_errors: u64,
}

/// The traversal engine.
pub struct Crawler {
    scraper: RankingsScraper,
    exporter: CsvExporter,
}

impl Crawler {
    /// Create a crawler over the given scraper and output writer.
    pub fn new(scraper: RankingsScraper, exporter: CsvExporter) -> Self {
        Self { scraper, exporter }
    }

    /// Run one full crawl.
    ///
    /// # Errors
    /// Fails when dropdown discovery or an event search fails; errors
    /// deeper in the hierarchy are logged, counted and skipped.
    pub async fn run(&self, options: &CrawlOptions) -> Result<CrawlStats> {
        let dropdowns = self.scraper.dropdown_options().await?;
        let keys = search_keys(&dropdowns, options.year);
        info!(tuples = keys.len(), "search space enumerated");

        let mut stats = CrawlStats::default();
        for key in &keys {
            info!(%key, "searching events");
            let events = self.scraper.search_events(key).await?;
            stats.search_tuples += 1;

            for event in &events {
                self.crawl_event(key, event, &mut stats).await?;
            }
        }

        info!(
            events = stats.events,
            races = stats.races,
            results = stats.results,
            skipped = stats.races_without_results,
            errors = stats.branch_errors,
            "crawl finished"
        );
        Ok(stats)
    }

    /// Resolve one event branch: write the event, then descend into
    /// its races. Failures below the event abandon only this branch;
    /// failing to persist the event itself is fatal, like the search
    /// that produced it.
    async fn crawl_event(
        &self,
        key: &SearchKey,
        event: &Event,
        stats: &mut CrawlStats,
    ) -> Result<()> {
        let dir = self.exporter.event_dir(key, &event.event_id);
        self.exporter.write_record(&dir, EVENT_FILE, &event.fields)?;
        stats.events += 1;

        let race_ids = match self.scraper.races_at_event(&event.event_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(event_id = %event.event_id, error = %e, "race list failed, branch abandoned");
                stats.branch_errors += 1;
                return Ok(());
            }
        };
        debug!(event_id = %event.event_id, races = race_ids.len(), "descending into races");

        for race_id in &race_ids {
            if let Err(e) = self.crawl_race(key, &event.event_id, race_id, stats).await {
                warn!(%race_id, error = %e, "race branch abandoned");
                stats.branch_errors += 1;
            }
        }
        Ok(())
    }

    /// Resolve one race branch: metadata always, results only when the
    /// metadata says a table exists.
    async fn crawl_race(
        &self,
        key: &SearchKey,
        event_id: &str,
        race_id: &str,
        stats: &mut CrawlStats,
    ) -> Result<()> {
        let race = self.scraper.race_data(race_id).await?;
        let dir = self
            .exporter
            .race_dir(key, event_id, &race.race_type(), race_id);
        self.exporter.write_record(&dir, RACE_FILE, &race.fields)?;
        stats.races += 1;

        if !race.has_results() {
            debug!(%race_id, "no results table, skipping");
            stats.races_without_results += 1;
            return Ok(());
        }

        let rows = self.scraper.race_results(race_id).await?;
        if rows.is_empty() {
            debug!(%race_id, "results table came back empty");
            return Ok(());
        }

        // Header set comes from the first record's field order.
        let headers: Vec<String> = rows[0].keys().cloned().collect();
        self.exporter
            .write_records(&dir, RESULTS_FILE, &headers, &rows)?;
        stats.results += 1;
        Ok(())
    }
}

/// Enumerate the search cross product in discovered dropdown order.
///
/// Distinct tuples may legitimately surface the same event; no
/// deduplication happens at this level.
pub fn search_keys(options: &DropdownOptions, year: Option<i32>) -> Vec<SearchKey> {
    let mut keys = Vec::new();
    for y in &options.years {
        if year.is_some_and(|only| only != *y) {
            continue;
        }
        for race_type in &options.race_types {
            for state in &options.states {
                keys.push(SearchKey {
                    year: *y,
                    race_type_id: race_type.race_type_id.clone(),
                    country_id: state.country_id.clone(),
                    state_id: state.state_id.clone(),
                });
            }
        }
    }
    keys
}
