//! Cache error types.
//!
//! Errors never leave [`HybridCache`](crate::HybridCache); they are produced
//! by the individual tiers and logged at the hybrid layer.

use thiserror::Error;

/// Errors raised by a cache tier.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Command failed on the Redis server or connection.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No connection could be checked out of the pool.
    #[error("redis pool error: {0}")]
    Pool(String),

    /// The tier is configured but cannot be reached.
    #[error("cache tier unavailable: {0}")]
    Unavailable(String),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Creates a pool error.
    #[must_use]
    pub fn pool(message: impl std::fmt::Display) -> Self {
        Self::Pool(message.to_string())
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether the error reflects a connectivity problem rather than bad data.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Unavailable(_))
            || matches!(self, Self::Redis(e) if e.is_io_error() || e.is_connection_dropped())
    }
}

/// Result alias for tier operations.
pub type CacheResult<T> = Result<T, CacheError>;
