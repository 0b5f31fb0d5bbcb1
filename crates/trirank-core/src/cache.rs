//! Expiring key-value cache for raw response bodies
//!
//! The cache is a pure byte-oriented expiring map: it knows nothing
//! about URLs, crawl structure or HTTP. Entries live in a
//! network-accessible backing store (Redis) so they persist across
//! process runs and can be shared by independent crawl invocations.
//! An in-memory backend with the same contract backs tests and
//! ephemeral runs.
//!
//! Payloads can optionally be zlib-compressed before storage. The
//! compression flag must match between the write and the read of an
//! entry; a mismatch surfaces as `CorruptEntry`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Result, TrirankError};

/// Fixed retention window: entries behave as absent after 5 days.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Storage backend contract: single-key get/set with expiry.
///
/// Implementations must tolerate concurrent readers and writers from
/// independent crawl processes using their own single-key atomicity;
/// no cross-key transactions are required.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Load raw bytes for a key. Absent and expired entries are both `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store raw bytes under a key with the given expiry.
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed cache store.
///
/// Uses a multiplexed async connection; clones share the underlying
/// connection, which gives the single-key atomicity the crawl relies
/// on when several invocations run against the same store.
#[derive(Clone)]
pub struct RedisBackend {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisBackend {
    /// Connect to a Redis instance.
    ///
    /// # Arguments
    /// * `url` - Connection URL, e.g. "redis://localhost:6379"
    ///
    /// # Errors
    /// Returns `CacheUnavailable` when the store cannot be reached.
    /// Callers treat this as fatal before any traversal work begins.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TrirankError::CacheUnavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| TrirankError::CacheUnavailable(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        use redis::AsyncCommands;
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        use redis::AsyncCommands;
        let mut conn = self.conn.clone();
        let () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| TrirankError::CacheUnavailable(e.to_string()))?;
        Ok(())
    }
}

/// In-process cache store with the same expiry contract.
///
/// Entries die with the process; useful for tests and for dry runs
/// that should not touch a shared Redis instance. Expiry follows the
/// tokio clock, so paused-time tests can drive it deterministically.
#[derive(Default)]
pub struct MemoryBackend {
    entries: std::sync::Mutex<HashMap<String, (Vec<u8>, tokio::time::Instant)>>,
}

impl MemoryBackend {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = tokio::time::Instant::now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        let expired = matches!(entries.get(key), Some((_, deadline)) if *deadline <= now);
        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|(bytes, _)| bytes.clone()))
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + ttl;
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), (value.to_vec(), deadline));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long entries stay retrievable (default: 5 days)
    pub retention: Duration,
    /// Whether payloads are zlib-compressed before storage
    pub compress: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            compress: false,
        }
    }
}

/// Read/write interface over an injected backend.
///
/// Handles the text-to-bytes conversion (UTF-8) and the optional
/// compression; everything else is the backend's concern. Passed
/// explicitly into the fetch layer, never held as process-wide state.
#[derive(Clone)]
pub struct HttpCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl HttpCache {
    /// Create a cache over the given backend.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    /// Verify the backing store is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    /// Load a cached response body.
    ///
    /// # Returns
    /// * `Ok(Some(body))` on a hit
    /// * `Ok(None)` when the key is absent or expired
    /// * `Err(TrirankError::CorruptEntry)` when the stored bytes cannot
    ///   be decompressed or are not valid UTF-8
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };

        let bytes = if self.config.compress {
            decompress(&raw).map_err(|_| TrirankError::CorruptEntry(key.to_string()))?
        } else {
            raw
        };

        let text = String::from_utf8(bytes)
            .map_err(|_| TrirankError::CorruptEntry(key.to_string()))?;
        Ok(Some(text))
    }

    /// Store a response body under a key.
    ///
    /// A no-op when either the key or the value is empty; callers must
    /// not rely on empty results being cached.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || value.is_empty() {
            return Ok(());
        }

        let data = if self.config.compress {
            compress(value.as_bytes())?
        } else {
            value.as_bytes().to_vec()
        };

        self.backend.set_ex(key, &data, self.config.retention).await
    }
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
