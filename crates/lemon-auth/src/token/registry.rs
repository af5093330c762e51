//! Revocation entries and single-session markers.
//!
//! Both live in the hybrid cache and expire on their own:
//!
//! | Entry | Key | Value | TTL |
//! |-------|-----|-------|-----|
//! | revocation | `lemon:jwt:revoked:{realm}:{jti}` | `true` | remaining token lifetime |
//! | session | `lemon:jwt:{realm}:{subject}` | current `jti` | realm token lifetime |
//!
//! Reads use the strict cache variants: if the distributed tier cannot be
//! consulted the answer is an error, which the validator turns into a
//! rejection. Session markers are read from the distributed tier first, since
//! a superseded `jti` left in the local tier would keep the old token alive.

use std::time::Duration;

use lemon_cache::{CacheResult, HybridCache};

/// Cache key of the active-session marker for a subject.
pub fn session_key(realm: &str, subject: &str) -> String {
    format!("lemon:jwt:{realm}:{subject}")
}

/// Cache key of a revocation entry.
pub fn revoked_key(realm: &str, jti: &str) -> String {
    format!("lemon:jwt:revoked:{realm}:{jti}")
}

/// Revocation and single-session registry.
#[derive(Clone)]
pub struct SessionRegistry {
    cache: HybridCache,
}

impl SessionRegistry {
    pub fn new(cache: HybridCache) -> Self {
        Self { cache }
    }

    /// Make `jti` the only valid token of `subject` in `realm`.
    pub async fn register_session(
        &self,
        realm: &str,
        subject: &str,
        jti: &str,
        ttl: Duration,
    ) -> bool {
        self.cache
            .set(&session_key(realm, subject), jti, Some(ttl))
            .await
    }

    /// The token id currently registered for `subject`.
    pub async fn current_session(&self, realm: &str, subject: &str) -> CacheResult<Option<String>> {
        self.cache.try_get_fresh(&session_key(realm, subject)).await
    }

    /// Whether `jti` is the registered token of `subject`.
    pub async fn is_current_session(&self, realm: &str, subject: &str, jti: &str) -> CacheResult<bool> {
        Ok(self
            .current_session(realm, subject)
            .await?
            .is_some_and(|current| current == jti))
    }

    /// Record `jti` as revoked for `ttl`.
    pub async fn revoke(&self, realm: &str, jti: &str, ttl: Duration) -> bool {
        self.cache
            .set(&revoked_key(realm, jti), &true, Some(ttl))
            .await
    }

    pub async fn is_revoked(&self, realm: &str, jti: &str) -> CacheResult<bool> {
        self.cache.try_exists(&revoked_key(realm, jti)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(session_key("admin", "42"), "lemon:jwt:admin:42");
        assert_eq!(revoked_key("admin", "abc"), "lemon:jwt:revoked:admin:abc");
    }

    #[tokio::test]
    async fn test_latest_session_wins() {
        let registry = SessionRegistry::new(HybridCache::local_only());
        let ttl = Duration::from_secs(60);
        registry.register_session("admin", "42", "first", ttl).await;
        registry.register_session("admin", "42", "second", ttl).await;

        assert!(!registry.is_current_session("admin", "42", "first").await.unwrap());
        assert!(registry.is_current_session("admin", "42", "second").await.unwrap());
        assert!(!registry.is_current_session("app", "42", "second").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_revocation_expires() {
        let registry = SessionRegistry::new(HybridCache::local_only());
        registry.revoke("admin", "j", Duration::from_secs(30)).await;
        assert!(registry.is_revoked("admin", "j").await.unwrap());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!registry.is_revoked("admin", "j").await.unwrap());
    }
}
