//! In-process distributed tier.
//!
//! Several [`HybridCache`](crate::HybridCache) instances sharing one
//! `MemoryTier` behave like processes sharing a Redis server, which makes
//! multi-instance scenarios testable without a container. The tier can be
//! switched offline to exercise degraded mode.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::{CacheError, CacheResult};
use crate::tier::{DistributedEntry, DistributedTier, TierMode};

#[derive(Debug)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct Inner {
    values: DashMap<String, StoredValue>,
    offline: AtomicBool,
}

/// Shared in-memory tier. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryTier {
    inner: Arc<Inner>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every operation fails.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .values
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> CacheResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(CacheError::unavailable("memory tier offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DistributedTier for MemoryTier {
    async fn get(&self, key: &str) -> CacheResult<Option<DistributedEntry>> {
        self.ensure_online()?;
        let now = Instant::now();
        let entry = self.inner.values.get(key).and_then(|stored| {
            if stored.is_expired(now) {
                None
            } else {
                Some(DistributedEntry {
                    data: stored.data.clone(),
                    ttl: stored.expires_at.map(|at| at.saturating_duration_since(now)),
                })
            }
        });
        if entry.is_none() {
            self.inner
                .values
                .remove_if(key, |_, stored| stored.is_expired(now));
        }
        Ok(entry)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        self.ensure_online()?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.inner.values.insert(
            key.to_string(),
            StoredValue {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.ensure_online()?;
        self.inner.values.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.ensure_online()?;
        let now = Instant::now();
        Ok(self
            .inner
            .values
            .get(key)
            .is_some_and(|stored| !stored.is_expired(now)))
    }

    fn mode(&self) -> TierMode {
        TierMode::Memory
    }

    async fn is_available(&self) -> bool {
        self.ensure_online().is_ok()
    }
}
