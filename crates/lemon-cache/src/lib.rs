//! Two-tier cache used by the Lemon admin backend.
//!
//! The cache is split into a fast per-process tier ([`LocalTier`], a
//! `DashMap` with per-entry TTL) and an optional shared tier behind the
//! [`DistributedTier`] trait. [`HybridCache`] composes the two with
//! read-through and write-through semantics.
//!
//! ## Tiers
//!
//! | Tier | Type | Scope |
//! |------|------|-------|
//! | L1 | [`LocalTier`] | single process |
//! | L2 | [`RedisTier`] | all instances |
//! | L2 (tests) | [`MemoryTier`] | in-process, shared by handle |
//! | L2 (off) | [`DisabledTier`] | no-op |
//!
//! The distributed tier is selected once, at construction, by
//! [`connect_distributed`]. Call sites never branch on whether Redis is
//! configured.
//!
//! ## Failure semantics
//!
//! Every public [`HybridCache`] operation swallows tier failures: errors are
//! logged with `tracing` and converted to an empty or `false` result. The
//! cache is never a source of request-path errors.

pub mod config;
pub mod error;
pub mod hybrid;
pub mod local;
pub mod memory;
pub mod pubsub;
pub mod redis;
pub mod tier;

pub use config::{CacheConfig, RedisConfig};
pub use error::{CacheError, CacheResult};
pub use hybrid::HybridCache;
pub use local::{CachedEntry, LocalStats, LocalTier};
pub use memory::MemoryTier;
pub use pubsub::InvalidationListener;
pub use redis::RedisTier;
pub use tier::{DisabledTier, DistributedEntry, DistributedTier, TierMode};

use std::sync::Arc;

/// Build the distributed tier described by `config`.
///
/// Returns a [`RedisTier`] when Redis is enabled and reachable, and a
/// [`DisabledTier`] otherwise. A Redis outage at startup is not fatal: the
/// process runs in local-only mode and logs a warning.
///
/// When Redis is selected, the cross-instance [`InvalidationListener`] is
/// started against `local`.
pub async fn connect_distributed(
    redis: &RedisConfig,
    cache: &CacheConfig,
    local: Arc<LocalTier>,
) -> Arc<dyn DistributedTier> {
    if !redis.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return Arc::new(DisabledTier);
    }

    tracing::info!(url = %redis.url, "Connecting to Redis");

    match RedisTier::connect(redis, &cache.invalidation_channel).await {
        Ok(tier) => {
            tracing::info!("Connected to Redis");
            InvalidationListener::new(
                redis.url.clone(),
                cache.invalidation_channel.clone(),
                local,
            )
            .start();
            Arc::new(tier)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            Arc::new(DisabledTier)
        }
    }
}
