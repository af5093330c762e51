//! Permission resolution with flag-versioned caching.
//!
//! Permission sets are cached under `permission:user:{subject}:{flag}`.
//! Any mutation of roles, menus or role assignments calls
//! [`PermissionResolver::refresh`], which bumps the flag: every previously
//! cached set becomes unreachable at once and ages out through the cache
//! TTL.

use std::collections::BTreeSet;
use std::sync::Arc;

use lemon_cache::HybridCache;

use crate::AuthResult;
use crate::clock::Clock;
use crate::config::{FlagScope, PermissionConfig};
use crate::storage::SubjectStore;

/// Cache key of the permission flag.
pub const FLAG_KEY: &str = "permission:flag";

/// Cache key of a subject's permission set under `flag`.
pub fn permission_key(subject_id: i64, flag: i64) -> String {
    format!("permission:user:{subject_id}:{flag}")
}

/// Maps subjects to their effective permissions.
#[derive(Clone)]
pub struct PermissionResolver {
    cache: HybridCache,
    store: Arc<dyn SubjectStore>,
    clock: Arc<dyn Clock>,
    config: PermissionConfig,
}

impl PermissionResolver {
    pub fn new(
        cache: HybridCache,
        store: Arc<dyn SubjectStore>,
        clock: Arc<dyn Clock>,
        config: PermissionConfig,
    ) -> Self {
        Self {
            cache,
            store,
            clock,
            config,
        }
    }

    pub fn super_admin_id(&self) -> i64 {
        self.config.super_admin_id
    }

    pub fn is_super_admin(&self, subject_id: i64) -> bool {
        subject_id == self.config.super_admin_id
    }

    // =========================================================================
    // Flag
    // =========================================================================

    /// Current flag, initialising it on first use.
    pub async fn get_flag(&self) -> i64 {
        match self.read_flag().await {
            Some(flag) if flag > 0 => flag,
            _ => self.refresh().await,
        }
    }

    /// Bump the flag, orphaning every cached permission set.
    ///
    /// The new flag is the current unix time, or the previous flag plus one
    /// if that is not larger, so two refreshes within one second still
    /// yield distinct flags.
    pub async fn refresh(&self) -> i64 {
        let previous = self.read_flag().await.unwrap_or(0);
        let flag = self.clock.now_unix().max(previous.saturating_add(1));
        self.write_flag(flag).await;
        tracing::info!(flag, scope = ?self.config.flag_scope, "permission flag refreshed");
        flag
    }

    async fn read_flag(&self) -> Option<i64> {
        match self.config.flag_scope {
            FlagScope::Local => self.cache.get_local(FLAG_KEY),
            FlagScope::Shared => self.cache.get(FLAG_KEY).await,
        }
    }

    async fn write_flag(&self, flag: i64) {
        match self.config.flag_scope {
            FlagScope::Local => {
                self.cache.set_local(FLAG_KEY, &flag, None);
            }
            FlagScope::Shared => {
                self.cache.set(FLAG_KEY, &flag, None).await;
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Effective permissions of a subject, sorted and de-duplicated.
    ///
    /// The super admin receives every menu permission; everyone else the
    /// union over their roles. A store failure yields an empty set, which is
    /// not cached.
    pub async fn get_user_permissions(&self, subject_id: i64) -> Vec<String> {
        let flag = self.get_flag().await;
        let key = permission_key(subject_id, flag);

        if let Some(cached) = self.cache.get_local::<Vec<String>>(&key) {
            return cached;
        }

        match self.load_permissions(subject_id).await {
            Ok(permissions) => {
                self.cache.set_local(&key, &permissions, self.config.cache_ttl);
                permissions
            }
            Err(e) => {
                tracing::error!(subject_id, error = %e, "failed to resolve permissions");
                Vec::new()
            }
        }
    }

    async fn load_permissions(&self, subject_id: i64) -> AuthResult<Vec<String>> {
        let raw = if self.is_super_admin(subject_id) {
            self.store.find_all_permissions().await?
        } else {
            let roles = self.store.find_roles_for_subject(subject_id).await?;
            if roles.is_empty() {
                Vec::new()
            } else {
                self.store.find_permissions_for_roles(&roles).await?
            }
        };

        let distinct: BTreeSet<String> = raw
            .into_iter()
            .filter(|permission| !permission.trim().is_empty())
            .collect();
        Ok(distinct.into_iter().collect())
    }

    /// Whether `subject_id` holds `permission`. The super admin always does.
    pub async fn check_permission(&self, subject_id: i64, permission: &str) -> bool {
        if self.is_super_admin(subject_id) {
            return true;
        }
        self.get_user_permissions(subject_id)
            .await
            .iter()
            .any(|granted| granted == permission)
    }
}
