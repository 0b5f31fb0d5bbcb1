//! Error types for the rankings crawler
//!
//! This module defines all error types used throughout the library.
//! A cache miss is deliberately *not* represented here: cache lookups
//! return `Option` so the read-through control flow stays explicit.

use thiserror::Error;

/// Error type for rankings crawler operations
#[derive(Error, Debug)]
pub enum TrirankError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Requested resource was not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Invalid identifier supplied to an operation
    #[error("Invalid identifier: '{0}'")]
    InvalidId(String),

    /// Failed to decode a structured payload (JSON or embedded JSON)
    #[error("Failed to decode payload: {0}")]
    Decode(String),

    /// Required HTML element was not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Cached bytes could not be decompressed or decoded
    #[error("Corrupt cache entry for key: {0}")]
    CorruptEntry(String),

    /// Cache store could not be reached at startup
    #[error("Cache store unavailable: {0}")]
    CacheUnavailable(String),

    /// Cache store failed during an in-flight operation
    #[error("Cache store error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Writing an output file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rankings crawler operations
pub type Result<T> = std::result::Result<T, TrirankError>;
