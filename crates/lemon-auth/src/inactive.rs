//! Per-realm deny-list of disabled subjects.
//!
//! The list for a realm is loaded from the [`SubjectStore`] on first use and
//! kept in the local tier for `inactive_ttl` (10 minutes by default). A
//! subject disabled or re-enabled in the store is therefore seen by this
//! process within one TTL window.

use std::sync::Arc;
use std::time::Duration;

use lemon_cache::HybridCache;

use crate::AuthResult;
use crate::storage::SubjectStore;

/// Cache key of the inactive list of a realm.
pub fn inactive_key(realm: &str) -> String {
    format!("lemon:user:inactive:{}", realm.to_lowercase())
}

/// Checks subjects against the realm's inactive list.
#[derive(Clone)]
pub struct InactiveSubjectGate {
    cache: HybridCache,
    store: Arc<dyn SubjectStore>,
    ttl: Duration,
}

impl InactiveSubjectGate {
    pub fn new(cache: HybridCache, store: Arc<dyn SubjectStore>, ttl: Duration) -> Self {
        Self { cache, store, ttl }
    }

    /// Whether `subject_id` is disabled in `realm`.
    ///
    /// A store failure counts as inactive. Ids that are not integers can
    /// never appear in the list.
    pub async fn is_inactive(&self, subject_id: &str, realm: &str) -> bool {
        let Ok(id) = subject_id.parse::<i64>() else {
            return false;
        };

        match self.inactive_ids(realm).await {
            Ok(ids) => ids.contains(&id),
            Err(e) => {
                tracing::error!(realm = %realm, error = %e, "failed to load inactive subjects");
                true
            }
        }
    }

    /// The cached inactive list, loading it on a miss. Failed loads are not
    /// cached.
    pub async fn inactive_ids(&self, realm: &str) -> AuthResult<Vec<i64>> {
        let key = inactive_key(realm);
        if let Some(ids) = self.cache.get_local::<Vec<i64>>(&key) {
            return Ok(ids);
        }

        let group = realm.to_lowercase();
        let ids = self.store.find_inactive_subject_ids(&group).await?;
        tracing::debug!(realm = %group, count = ids.len(), "loaded inactive subjects");
        self.cache.set_local(&key, &ids, Some(self.ttl));
        Ok(ids)
    }

    /// Drop the cached list so the next check reloads it.
    pub fn invalidate(&self, realm: &str) {
        self.cache.remove_local(&inactive_key(realm));
    }
}
