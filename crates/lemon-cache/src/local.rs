//! L1 tier: per-process `DashMap` with optional per-entry TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A cached entry with optional TTL.
///
/// The data is wrapped in `Arc` so hits clone a pointer, not the payload.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Option<Duration>,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired. Entries without TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.cached_at.elapsed() >= ttl)
    }

    /// Remaining lifetime, `None` when the entry has no TTL.
    pub fn remaining(&self) -> Option<Duration> {
        self.ttl.map(|ttl| ttl.saturating_sub(self.cached_at.elapsed()))
    }
}

/// Snapshot of local tier counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalStats {
    /// Number of entries currently stored (including not-yet-swept expired ones).
    pub entries: usize,
    /// Number of lookups that returned a live entry.
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry.
    pub misses: u64,
    /// Number of entries dropped because they expired.
    pub evictions: u64,
}

impl LocalStats {
    /// Hit rate in `[0.0, 1.0]`; zero before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-process cache tier.
///
/// Expired entries are removed lazily on access and eagerly by
/// [`cleanup_expired`](Self::cleanup_expired), which the background sweeper
/// calls periodically.
#[derive(Debug, Default)]
pub struct LocalTier {
    entries: DashMap<String, CachedEntry>,
    default_ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LocalTier {
    /// Create an empty tier whose entries expire only when given a TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tier applying `default_ttl` to writes without TTL.
    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            default_ttl,
            ..Self::default()
        }
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.get_entry(key).map(|entry| entry.data)
    }

    /// Look up a live entry together with its metadata.
    pub fn get_entry(&self, key: &str) -> Option<CachedEntry> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.clone());
            }
            drop(entry);
            if self
                .entries
                .remove_if(key, |_, entry| entry.is_expired())
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value. `ttl = None` falls back to the tier default.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let ttl = ttl.or(self.default_ttl);
        self.entries.insert(key.to_string(), CachedEntry::new(value, ttl));
    }

    /// Remove a key. Returns whether a live entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some_and(|(_, entry)| !entry.is_expired())
    }

    /// Whether a live entry exists. Does not touch hit/miss counters.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.is_expired())
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> LocalStats {
        LocalStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Spawn a task calling [`cleanup_expired`](Self::cleanup_expired) every
    /// `interval`. The task holds a weak reference and exits once the tier
    /// is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let tier: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(live) = tier.upgrade() else {
                    tracing::debug!("local cache dropped, stopping sweeper");
                    return;
                };
                let removed = live.cleanup_expired();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired local cache entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let tier = LocalTier::new();
        tier.set("k", b"v".to_vec(), None);

        assert_eq!(tier.get("k"), Some(Arc::new(b"v".to_vec())));
        assert!(tier.exists("k"));
        assert_eq!(tier.get("missing"), None);

        let stats = tier.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration() {
        let tier = LocalTier::new();
        tier.set("k", b"v".to_vec(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(tier.get("k").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(tier.get("k").is_none());
        assert!(!tier.exists("k"));
        assert_eq!(tier.stats().evictions, 1);
        assert!(tier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_applies_only_without_explicit_ttl() {
        let tier = LocalTier::with_default_ttl(Some(Duration::from_secs(5)));
        tier.set("short", b"1".to_vec(), None);
        tier.set("long", b"2".to_vec(), Some(Duration::from_secs(60)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(tier.get("short").is_none());
        assert!(tier.get("long").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining() {
        let entry = CachedEntry::new(vec![], Some(Duration::from_secs(30)));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(entry.remaining(), Some(Duration::from_secs(20)));

        let forever = CachedEntry::new(vec![], None);
        assert_eq!(forever.remaining(), None);
        assert!(!forever.is_expired());
    }

    #[tokio::test]
    async fn test_remove_reports_live_entries() {
        let tier = LocalTier::new();
        tier.set("k", b"v".to_vec(), None);
        assert!(tier.remove("k"));
        assert!(!tier.remove("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let tier = LocalTier::new();
        tier.set("a", vec![1], Some(Duration::from_secs(1)));
        tier.set("b", vec![2], Some(Duration::from_secs(1)));
        tier.set("c", vec![3], None);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(tier.cleanup_expired(), 2);
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.stats().evictions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_entries() {
        let tier = Arc::new(LocalTier::new());
        tier.set("a", vec![1], Some(Duration::from_secs(1)));
        let handle = tier.spawn_sweeper(Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(tier.len(), 0);

        drop(tier);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_clear() {
        let tier = LocalTier::new();
        tier.set("a", vec![1], None);
        tier.set("b", vec![2], None);
        tier.clear();
        assert!(tier.is_empty());
    }
}
