//! Cache configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Redis configuration for horizontal scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it).
    /// Default: false (single-instance deployments)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Local tier and invalidation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied to local writes that carry none. `None` keeps such
    /// entries until they are removed or the process exits.
    #[serde(with = "humantime_serde")]
    pub local_default_ttl: Option<Duration>,

    /// Upper bound for entries promoted from the distributed tier.
    ///
    /// Promoted entries inherit the remaining distributed TTL; entries that
    /// have no distributed TTL are capped by this value when it is set.
    #[serde(with = "humantime_serde")]
    pub max_backfill_ttl: Option<Duration>,

    /// Pub/sub channel carrying invalidated keys between instances.
    pub invalidation_channel: String,

    /// How often the local sweeper drops expired entries.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_default_ttl: None,
            max_backfill_ttl: Some(Duration::from_secs(3600)),
            invalidation_channel: "lemon:cache:invalidate".to_string(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
