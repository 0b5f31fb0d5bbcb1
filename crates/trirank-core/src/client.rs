//! HTTP client with rate limiting for the rankings site
//!
//! This module provides a rate-limited HTTP client for
//! rankings.usatriathlon.org. The limiter enforces a flat minimum
//! interval between outbound requests; it is only ever exercised on
//! the cache-miss path, so cached fetches bypass it entirely.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Result, TrirankError};

/// Base URL for the rankings site
const RANKINGS_BASE_URL: &str = "https://rankings.usatriathlon.org";

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default minimum spacing between uncached requests
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter to control request frequency
///
/// Ensures that consecutive requests are spaced at least
/// `min_interval` apart. A flat per-call delay: no burst allowance and
/// no adaptive backoff.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum interval.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(Instant::now() - min_interval)),
        }
    }

    /// Acquire permission to make a request.
    ///
    /// Sleeps if necessary so that the minimum interval since the
    /// previous request is respected. Cannot fail; it only delays.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the rankings HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the rankings site; injectable for mock servers
    pub base_url: String,
    /// Minimum spacing between uncached requests (default: 1.5 s)
    pub min_interval: Duration,
    /// Per-request timeout (default: 30 s)
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: RANKINGS_BASE_URL.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the rankings site
///
/// Keeps a cookie store across requests (the site expects a session)
/// and spaces outbound calls through the [`RateLimiter`]. There is no
/// retry logic: the fetch layer guarantees at most one remote call per
/// request key, and a failed call surfaces immediately.
pub struct RankingsClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Rate limiter for request throttling
    rate_limiter: RateLimiter,
    /// Base URL requests are resolved against
    base_url: String,
}

impl RankingsClient {
    /// Create a new client with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.min_interval),
            base_url: config.base_url,
        })
    }

    /// Base URL this client resolves paths against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a page with a GET request.
    ///
    /// # Arguments
    /// * `path` - Relative path on the rankings site (e.g. "/Event/Events")
    ///
    /// # Errors
    /// - `TrirankError::NotFound` - Server returned 404
    /// - `TrirankError::RateLimited` - Server returned 429
    /// - `TrirankError::Status` - Any other non-success status
    /// - `TrirankError::Http` - Transport failure or timeout
    pub async fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        self.rate_limiter.acquire().await;

        let response = self.client.get(&url).send().await?;
        Self::body_text(&url, response).await
    }

    /// Post a JSON body and return the response text.
    ///
    /// The search and race endpoints all take POSTed JSON documents.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        self.rate_limiter.acquire().await;

        let response = self.client.post(&url).json(body).send().await?;
        Self::body_text(&url, response).await
    }

    /// Map the response status and extract the body.
    async fn body_text(url: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TrirankError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TrirankError::RateLimited);
        }

        Err(TrirankError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(1500));
        assert_eq!(limiter.min_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, RANKINGS_BASE_URL);
        assert_eq!(config.min_interval, Duration::from_millis(1500));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_client_creation() {
        let client = RankingsClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_custom_base_url() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9999".to_string(),
            ..ClientConfig::default()
        };
        let client = RankingsClient::with_config(config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire must wait out the interval
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));

        let start = Instant::now();
        limiter.acquire().await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
