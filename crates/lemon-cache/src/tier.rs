//! The distributed (L2) tier abstraction.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Value read from a distributed tier together with its remaining lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedEntry {
    pub data: Vec<u8>,
    /// Remaining TTL reported by the tier; `None` when the key never expires.
    pub ttl: Option<Duration>,
}

/// Which implementation backs the distributed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierMode {
    Disabled,
    Memory,
    Redis,
}

impl TierMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for TierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared cache tier visible to every process.
///
/// Implementations return errors freely; [`HybridCache`](crate::HybridCache)
/// logs and absorbs them. Writes and removals should notify other instances
/// so they can drop stale local copies.
#[async_trait]
pub trait DistributedTier: Send + Sync {
    /// Fetch a value and its remaining TTL.
    async fn get(&self, key: &str) -> CacheResult<Option<DistributedEntry>>;

    /// Store a value. `ttl = None` stores without expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Whether the key currently exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Implementation in use, for logs and health output.
    fn mode(&self) -> TierMode;

    /// Cheap reachability test used by health checks.
    async fn is_available(&self) -> bool;
}

/// Distributed tier used when no backend is configured.
///
/// Every operation succeeds: reads find nothing, writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTier;

#[async_trait]
impl DistributedTier for DisabledTier {
    async fn get(&self, _key: &str) -> CacheResult<Option<DistributedEntry>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    fn mode(&self) -> TierMode {
        TierMode::Disabled
    }

    async fn is_available(&self) -> bool {
        false
    }
}
