//! Rankings Crawler Core Library
//!
//! This crate crawls the USA Triathlon rankings site: a fixed search
//! space of (year, race type, country, state) tuples fanning out to
//! events, races, race metadata and optional results tables.
//!
//! # Features
//! - Read-through response cache (Redis-backed, zlib-optional) so a
//!   request key hits the network at most once per retention window
//! - Rate-limited HTTP client applied only on the cache-miss path
//! - Depth-first traversal that persists every resolved entity as CSV
//!   before advancing, keeping long interruptible crawls incremental

pub mod cache;
pub mod client;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod scraper;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheBackend, CacheConfig, HttpCache, MemoryBackend, RedisBackend};
pub use client::{ClientConfig, RankingsClient, RateLimiter};
pub use crawl::{search_keys, CrawlOptions, CrawlStats, Crawler};
pub use error::{Result, TrirankError};
pub use fetch::CachedFetcher;
pub use output::CsvExporter;
pub use scraper::RankingsScraper;
pub use types::{DropdownOptions, Event, RaceData, RaceTypeOption, Record, SearchKey, StateOption};
