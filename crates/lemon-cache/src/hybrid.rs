//! Read-through / write-through composition of the local and distributed tiers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheResult;
use crate::local::{LocalStats, LocalTier};
use crate::tier::{DisabledTier, DistributedTier, TierMode};

/// Two-tier cache: L1 ([`LocalTier`]) + L2 ([`DistributedTier`]).
///
/// Values are JSON-encoded. Each operation comes in three flavours: the
/// combined form, a `_local` form and a `_distributed` form.
///
/// ## Lookup Order
///
/// 1. L1 hit: returned immediately.
/// 2. L2 hit: promoted to L1 with the remaining L2 TTL (capped by
///    `max_backfill_ttl`), then returned.
/// 3. Otherwise absent.
///
/// ## Write Strategy
///
/// L1 first, then L2. An L2 failure is logged and the write still counts as
/// successful, so the current process keeps working in degraded mode.
#[derive(Clone)]
pub struct HybridCache {
    local: Arc<LocalTier>,
    distributed: Arc<dyn DistributedTier>,
    max_backfill_ttl: Option<Duration>,
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub local: LocalStats,
    pub mode: TierMode,
}

impl HybridCache {
    pub fn new(local: Arc<LocalTier>, distributed: Arc<dyn DistributedTier>) -> Self {
        Self {
            local,
            distributed,
            max_backfill_ttl: None,
        }
    }

    /// Cache without a distributed tier.
    pub fn local_only() -> Self {
        Self::new(Arc::new(LocalTier::new()), Arc::new(DisabledTier))
    }

    /// Cap the TTL of entries promoted from the distributed tier.
    #[must_use]
    pub fn with_max_backfill_ttl(mut self, max: Option<Duration>) -> Self {
        self.max_backfill_ttl = max;
        self
    }

    pub fn local(&self) -> &Arc<LocalTier> {
        &self.local
    }

    pub fn distributed(&self) -> &Arc<dyn DistributedTier> {
        &self.distributed
    }

    pub fn mode(&self) -> TierMode {
        self.distributed.mode()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            local: self.local.stats(),
            mode: self.distributed.mode(),
        }
    }

    /// Check if the distributed tier is reachable (for health checks).
    pub async fn is_distributed_available(&self) -> bool {
        self.distributed.is_available().await
    }

    // =========================================================================
    // Set
    // =========================================================================

    /// Write to both tiers. Returns `false` only if the value cannot be encoded.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        let Some(bytes) = encode(key, value) else {
            return false;
        };
        self.local.set(key, bytes.clone(), ttl);
        if let Err(e) = self.distributed.set(key, bytes, ttl).await {
            tracing::warn!(key = %key, error = %e, "distributed cache SET failed, kept local copy");
        } else {
            tracing::debug!(key = %key, mode = %self.mode(), "cache set (L1+L2)");
        }
        true
    }

    /// Write to the local tier only.
    pub fn set_local<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized,
    {
        let Some(bytes) = encode(key, value) else {
            return false;
        };
        self.local.set(key, bytes, ttl);
        true
    }

    /// Write to the distributed tier only. Returns `false` on tier failure.
    pub async fn set_distributed<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        let Some(bytes) = encode(key, value) else {
            return false;
        };
        match self.distributed.set(key, bytes, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache SET failed");
                false
            }
        }
    }

    // =========================================================================
    // Get
    // =========================================================================

    /// Read through both tiers, promoting distributed hits to the local tier.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(data) = self.local.get(key) {
            tracing::debug!(key = %key, "cache hit (L1)");
            return decode(key, &data);
        }

        let entry = match self.distributed.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache GET failed");
                return None;
            }
        };

        tracing::debug!(key = %key, "cache hit (L2)");
        let value = decode(key, &entry.data)?;
        let ttl = self.backfill_ttl(entry.ttl);
        self.local.set(key, entry.data, ttl);
        Some(value)
    }

    /// Read the local tier only.
    pub fn get_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.local.get(key).and_then(|data| decode(key, &data))
    }

    /// Read the distributed tier only, without promotion.
    pub async fn get_distributed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.distributed.get(key).await {
            Ok(entry) => entry.and_then(|entry| decode(key, &entry.data)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache GET failed");
                None
            }
        }
    }

    /// Like [`get`](Self::get), but a distributed-tier or decoding failure is
    /// returned instead of being treated as absent. For callers that must
    /// fail closed.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        if let Some(data) = self.local.get(key) {
            return Ok(Some(serde_json::from_slice(&data)?));
        }
        let Some(entry) = self.distributed.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&entry.data)?;
        let ttl = self.backfill_ttl(entry.ttl);
        self.local.set(key, entry.data, ttl);
        Ok(Some(value))
    }

    /// Strict read that asks the distributed tier first whenever one is
    /// configured, so a local copy that missed an invalidation is never
    /// served. The local copy is overwritten with the answer, or dropped when
    /// the key is gone. Falls back to the local tier only in `Disabled` mode.
    pub async fn try_get_fresh<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        if self.mode() == TierMode::Disabled {
            return match self.local.get(key) {
                Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
                None => Ok(None),
            };
        }
        let Some(entry) = self.distributed.get(key).await? else {
            self.local.remove(key);
            return Ok(None);
        };
        let value = serde_json::from_slice(&entry.data)?;
        let ttl = self.backfill_ttl(entry.ttl);
        self.local.set(key, entry.data, ttl);
        Ok(Some(value))
    }

    fn backfill_ttl(&self, remaining: Option<Duration>) -> Option<Duration> {
        match (remaining, self.max_backfill_ttl) {
            (Some(remaining), Some(max)) => Some(remaining.min(max)),
            (Some(remaining), None) => Some(remaining),
            (None, max) => max,
        }
    }

    // =========================================================================
    // Remove
    // =========================================================================

    /// Remove from both tiers. A distributed failure is logged only.
    pub async fn remove(&self, key: &str) -> bool {
        self.local.remove(key);
        if let Err(e) = self.distributed.remove(key).await {
            tracing::warn!(key = %key, error = %e, "distributed cache DEL failed");
        }
        true
    }

    pub fn remove_local(&self, key: &str) -> bool {
        self.local.remove(key);
        true
    }

    /// Remove from the distributed tier only. Returns `false` on tier failure.
    pub async fn remove_distributed(&self, key: &str) -> bool {
        match self.distributed.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache DEL failed");
                false
            }
        }
    }

    // =========================================================================
    // Exists
    // =========================================================================

    /// Whether the key exists in either tier.
    pub async fn exists(&self, key: &str) -> bool {
        self.local.exists(key) || self.exists_distributed(key).await
    }

    /// Like [`exists`](Self::exists), but surfaces distributed-tier failures.
    pub async fn try_exists(&self, key: &str) -> CacheResult<bool> {
        if self.local.exists(key) {
            return Ok(true);
        }
        self.distributed.exists(key).await
    }

    pub fn exists_local(&self, key: &str) -> bool {
        self.local.exists(key)
    }

    pub async fn exists_distributed(&self, key: &str) -> bool {
        match self.distributed.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache EXISTS failed");
                false
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to serialize cache value");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: &[u8]) -> Option<T> {
    match serde_json::from_slice(data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to deserialize cache value");
            None
        }
    }
}
