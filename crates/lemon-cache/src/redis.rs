//! Redis implementation of the distributed tier.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::error::{CacheError, CacheResult};
use crate::tier::{DistributedEntry, DistributedTier, TierMode};

/// Distributed tier backed by a `deadpool-redis` pool.
///
/// Values are stored as raw bytes. Every `set` and `remove` publishes the key
/// on the invalidation channel so that other instances drop their local copy
/// (see [`InvalidationListener`](crate::InvalidationListener)).
#[derive(Clone)]
pub struct RedisTier {
    pool: Pool,
    channel: String,
}

impl RedisTier {
    /// Wrap an existing pool.
    pub fn new(pool: Pool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Build a pool from `config` and verify that a connection can be made.
    pub async fn connect(config: &RedisConfig, channel: &str) -> CacheResult<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let mut redis_config = deadpool_redis::Config::from_url(&config.url);
        let mut pool_config = redis_config.pool.unwrap_or_default();
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(CacheError::pool)?;

        // Test connection
        let mut conn = pool.get().await.map_err(CacheError::pool)?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await?;

        Ok(Self::new(pool, channel))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    async fn connection(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(CacheError::pool)
    }

    async fn publish(&self, conn: &mut deadpool_redis::Connection, key: &str) {
        if let Err(e) = conn.publish::<_, _, ()>(&self.channel, key).await {
            tracing::warn!(key = %key, error = %e, "Redis PUBLISH error");
        } else {
            tracing::debug!(key = %key, channel = %self.channel, "published cache invalidation");
        }
    }
}

/// Convert a `PTTL` reply into a remaining lifetime.
///
/// `-1` means the key has no expiry, `-2` that it does not exist.
fn ttl_from_pttl(pttl: i64) -> Option<Duration> {
    u64::try_from(pttl).ok().map(Duration::from_millis)
}

#[async_trait]
impl DistributedTier for RedisTier {
    async fn get(&self, key: &str) -> CacheResult<Option<DistributedEntry>> {
        let mut conn = self.connection().await?;
        let (data, pttl): (Option<Vec<u8>>, i64) = redis::pipe()
            .get(key)
            .pttl(key)
            .query_async(&mut conn)
            .await?;

        Ok(data.map(|data| DistributedEntry {
            data,
            ttl: ttl_from_pttl(pttl),
        }))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                // PSETEX rejects a zero expiry
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(key, value, millis).await?;
            }
            None => {
                conn.set::<_, _, ()>(key, value).await?;
            }
        }
        self.publish(&mut conn, key).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        self.publish(&mut conn, key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists::<_, bool>(key).await?)
    }

    fn mode(&self) -> TierMode {
        TierMode::Redis
    }

    async fn is_available(&self) -> bool {
        self.pool.get().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_from_pttl() {
        assert_eq!(ttl_from_pttl(1500), Some(Duration::from_millis(1500)));
        assert_eq!(ttl_from_pttl(-1), None);
        assert_eq!(ttl_from_pttl(-2), None);
    }
}
