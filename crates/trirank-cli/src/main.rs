//! Rankings crawler command-line entry point
//!
//! Wires the core library together: argument parsing, logging setup,
//! the startup cache connectivity check, and one crawl invocation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trirank_core::{
    CacheBackend, CacheConfig, CachedFetcher, ClientConfig, CrawlOptions, Crawler, CsvExporter,
    HttpCache, MemoryBackend, RankingsClient, RankingsScraper, RedisBackend,
};

/// Crawl the USA Triathlon rankings site.
///
/// Walks every discovered (year, race type, state) search combination,
/// persisting events, races and race results as CSV files. Responses
/// are cached in Redis for five days, so interrupted crawls can be
/// re-run without re-paying the rate-limited network cost.
#[derive(Parser, Debug)]
#[command(name = "trirank")]
#[command(version)]
#[command(about = "Crawl the USA Triathlon rankings site", long_about = None)]
struct Cli {
    /// Restrict the crawl to a single year (default: all discovered years)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output directory for CSV files
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Redis connection URL for the response cache
    #[arg(long, default_value = "redis://localhost:6379")]
    redis_url: String,

    /// Compress cached payloads with zlib
    #[arg(long)]
    compress: bool,

    /// Use an in-process cache instead of Redis (entries die with the run)
    #[arg(long)]
    memory_cache: bool,

    /// Minimum delay between uncached requests, in milliseconds
    #[arg(long, default_value_t = 1500)]
    min_interval_ms: u64,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let backend: Arc<dyn CacheBackend> = if cli.memory_cache {
        tracing::warn!("using in-process cache; nothing persists across runs");
        Arc::new(MemoryBackend::new())
    } else {
        tracing::info!("connecting to cache store at {}", cli.redis_url);
        Arc::new(RedisBackend::connect(&cli.redis_url).await?)
    };

    let cache = HttpCache::new(
        backend,
        CacheConfig {
            compress: cli.compress,
            ..CacheConfig::default()
        },
    );

    // An unreachable store aborts before any traversal work begins.
    cache.ping().await?;
    tracing::info!("cache store reachable");

    let client = RankingsClient::with_config(ClientConfig {
        min_interval: Duration::from_millis(cli.min_interval_ms),
        ..ClientConfig::default()
    })?;

    let scraper = RankingsScraper::new(CachedFetcher::new(client, cache));
    let crawler = Crawler::new(scraper, CsvExporter::new(&cli.output));

    let stats = crawler.run(&CrawlOptions { year: cli.year }).await?;

    println!("Crawl complete:");
    println!("  search tuples: {}", stats.search_tuples);
    println!("  events:        {}", stats.events);
    println!("  races:         {}", stats.races);
    println!("  results:       {}", stats.results);
    println!("  skipped races: {}", stats.races_without_results);
    println!("  branch errors: {}", stats.branch_errors);

    Ok(())
}

/// Set up the tracing subscriber from the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trirank_core=info,trirank=info,warn"),
            1 => EnvFilter::new("trirank_core=debug,trirank=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["trirank"]).unwrap();
        assert_eq!(cli.year, None);
        assert_eq!(cli.output, PathBuf::from("data"));
        assert_eq!(cli.redis_url, "redis://localhost:6379");
        assert!(!cli.compress);
        assert!(!cli.memory_cache);
        assert_eq!(cli.min_interval_ms, 1500);
    }

    #[test]
    fn test_cli_year_filter() {
        let cli = Cli::try_parse_from(["trirank", "--year", "2021"]).unwrap();
        assert_eq!(cli.year, Some(2021));
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["trirank", "-q", "-v"]).is_err());
    }
}
