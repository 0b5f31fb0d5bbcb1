//! Probe the live rankings site: discover the dropdown option sets and
//! list the events of the first search tuple. Uses an in-process cache
//! so nothing is written to Redis.
//!
//! Run with: cargo run -p trirank-core --example live_probe

use std::sync::Arc;

use trirank_core::{
    search_keys, CacheConfig, CachedFetcher, HttpCache, MemoryBackend, RankingsClient,
    RankingsScraper,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = RankingsClient::new()?;
    let cache = HttpCache::new(Arc::new(MemoryBackend::new()), CacheConfig::default());
    let scraper = RankingsScraper::new(CachedFetcher::new(client, cache));

    println!("Discovering search options...\n");
    let options = scraper.dropdown_options().await?;

    println!(
        "{} years, {} race types, {} states",
        options.years.len(),
        options.race_types.len(),
        options.states.len()
    );
    println!("years: {:?}", options.years);
    for race_type in &options.race_types {
        println!("  race type {}: {}", race_type.race_type_id, race_type.value);
    }

    let keys = search_keys(&options, None);
    println!("\n{} search tuples in total", keys.len());

    if let Some(first) = keys.first() {
        println!("\nSearching events for {}...", first);
        let events = scraper.search_events(first).await?;
        println!("{} events found", events.len());
        for event in events.iter().take(10) {
            println!("  event {}", event.event_id);
        }
    }

    Ok(())
}
