//! Application state and its wiring from configuration.

use std::sync::Arc;

use anyhow::Context;
use lemon_auth::{
    Account, AccountStore, AuthServices, AuthState, InMemoryStore, OperationLogSink,
    SubjectStore, SystemClock, password::hash_password,
};
use lemon_auth_postgres::PostgresStore;
use lemon_cache::{HybridCache, LocalTier, connect_distributed};
use tokio::task::JoinHandle;

use crate::config::{AdminUserConfig, AppConfig};
use crate::routes;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub services: AuthServices,
    pub accounts: Arc<dyn AccountStore>,
    pub cache: HybridCache,
}

/// The three storage roles, backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub subjects: Arc<dyn SubjectStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub audit: Arc<dyn OperationLogSink>,
}

impl Stores {
    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            subjects: store.clone(),
            accounts: store.clone(),
            audit: store,
        }
    }

    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        Self {
            subjects: store.clone(),
            accounts: store.clone(),
            audit: store,
        }
    }
}

impl AppState {
    /// Assemble the auth core over an already built cache and stores.
    pub fn new(cfg: &AppConfig, cache: HybridCache, stores: Stores) -> anyhow::Result<Self> {
        let services = AuthServices::build(
            &cfg.auth,
            cache.clone(),
            stores.subjects,
            Arc::new(SystemClock),
        )
        .context("invalid auth configuration")?;

        let auth = AuthState::new(
            Arc::clone(&services.tokens),
            Arc::clone(&services.permissions),
            routes(),
            stores.audit,
        );

        Ok(Self {
            auth,
            services,
            accounts: stores.accounts,
            cache,
        })
    }
}

/// Connect the cache tiers and the store described by `cfg`.
///
/// Returns the state together with the local sweeper task.
pub async fn connect(cfg: &AppConfig) -> anyhow::Result<(AppState, JoinHandle<()>)> {
    let local = Arc::new(LocalTier::with_default_ttl(cfg.cache.local_default_ttl));
    let sweeper = local.spawn_sweeper(cfg.cache.sweep_interval);
    let distributed = connect_distributed(&cfg.redis, &cfg.cache, Arc::clone(&local)).await;
    let cache =
        HybridCache::new(local, distributed).with_max_backfill_ttl(cfg.cache.max_backfill_ttl);

    let stores = match cfg.postgres {
        Some(ref pg) => {
            let store = PostgresStore::connect(&pg.url, pg.pool_size)
                .await
                .context("failed to connect to PostgreSQL")?;
            if pg.run_migrations {
                store.migrate().await.context("failed to migrate schema")?;
            }
            if let Some(ref admin) = cfg.bootstrap.admin_user {
                let hash = hash_admin_password(admin)?;
                let id = store
                    .ensure_account(
                        &admin.username,
                        admin.nickname.as_deref().unwrap_or_default(),
                        &hash,
                    )
                    .await
                    .context("failed to bootstrap admin account")?;
                tracing::info!(username = %admin.username, id, "admin account ready");
            }
            Stores::postgres(store)
        }
        None => {
            tracing::warn!("postgres not configured, using the in-memory store");
            let store = InMemoryStore::new();
            if let Some(ref admin) = cfg.bootstrap.admin_user {
                store
                    .add_account(Account {
                        id: cfg.auth.permission.super_admin_id,
                        username: admin.username.clone(),
                        nickname: admin.nickname.clone(),
                        password_hash: hash_admin_password(admin)?,
                        enabled: true,
                    })
                    .await;
                tracing::info!(username = %admin.username, "admin account ready");
            }
            Stores::in_memory(store)
        }
    };

    let state = AppState::new(cfg, cache, stores)?;
    let realms: Vec<&str> = state.services.tokens.realms().names().collect();
    tracing::info!(
        cache_mode = %state.cache.mode(),
        realms = ?realms,
        "auth core initialized"
    );
    Ok((state, sweeper))
}

fn hash_admin_password(admin: &AdminUserConfig) -> anyhow::Result<String> {
    hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))
}
