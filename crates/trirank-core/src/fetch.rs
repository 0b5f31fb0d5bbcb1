//! Read-through fetch layer
//!
//! Composes the cache store with the rate-limited HTTP client behind a
//! single contract: look the request up in the cache, otherwise make
//! the remote call and populate the cache before decoding. The remote
//! call therefore runs at most once per distinct request key per
//! retention window, which is the central performance property of the
//! whole crawl.

use std::future::Future;

use crate::cache::HttpCache;
use crate::client::RankingsClient;
use crate::error::Result;

/// Cache-backed fetcher for remote calls.
///
/// Both collaborators are injected at construction; tests substitute
/// an in-memory cache backend and a mock server base URL.
pub struct CachedFetcher {
    client: RankingsClient,
    cache: HttpCache,
}

impl CachedFetcher {
    /// Create a fetcher over the given client and cache.
    pub fn new(client: RankingsClient, cache: HttpCache) -> Self {
        Self { client, cache }
    }

    /// The HTTP client remote-call closures are built against.
    pub fn client(&self) -> &RankingsClient {
        &self.client
    }

    /// The cache store backing this fetcher.
    pub fn cache(&self) -> &HttpCache {
        &self.cache
    }

    /// Resolve one logical remote call through the cache.
    ///
    /// # Arguments
    /// * `key` - Canonical request key: a deterministic, collision-free
    ///   encoding of the endpoint and every parameter that affects the
    ///   response
    /// * `remote` - The actual network call, only invoked on a miss;
    ///   the client applies the rate limit inside it
    /// * `decode` - Parses the body, cached or fresh, into the result
    ///
    /// The raw body is written to the cache before decoding, so a
    /// decode failure is never retried against the network: the next
    /// attempt decodes the cached bytes again. A remote failure
    /// surfaces immediately and leaves the cache untouched.
    pub async fn fetch_with<T, F, Fut, D>(&self, key: &str, remote: F, decode: D) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
        D: FnOnce(&str) -> Result<T>,
    {
        if let Some(body) = self.cache.get(key).await? {
            tracing::debug!(key, "cache hit");
            return decode(&body);
        }

        tracing::debug!(key, "cache miss");
        let body = remote().await?;
        self.cache.set(key, &body).await?;
        decode(&body)
    }
}
