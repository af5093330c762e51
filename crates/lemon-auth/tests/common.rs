#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lemon_auth::{
    AuthConfig, AuthServices, InMemoryStore, ManualClock, PermissionConfig, RealmConfig,
};
use lemon_cache::HybridCache;

pub const SECRET: &str = "lemon-test-secret-0123456789abcdef";

pub fn realm(name: &str, lifetime_minutes: u64, sso: bool) -> RealmConfig {
    RealmConfig {
        name: name.to_string(),
        secret: SECRET.to_string(),
        issuer: "lemon".to_string(),
        audience: format!("lemon-{name}"),
        lifetime_minutes,
        sso,
    }
}

pub struct Harness {
    pub services: AuthServices,
    pub store: InMemoryStore,
    pub clock: Arc<ManualClock>,
    pub cache: HybridCache,
}

pub fn harness(realms: Vec<RealmConfig>) -> Harness {
    harness_with_cache(realms, HybridCache::local_only())
}

pub fn harness_with_cache(realms: Vec<RealmConfig>, cache: HybridCache) -> Harness {
    let config = AuthConfig {
        realms,
        permission: PermissionConfig {
            inactive_ttl: Duration::from_secs(600),
            ..PermissionConfig::default()
        },
    };
    let store = InMemoryStore::new();
    let clock = Arc::new(ManualClock::starting_now());
    let services = AuthServices::build(
        &config,
        cache.clone(),
        Arc::new(store.clone()),
        clock.clone(),
    )
    .expect("valid config");
    Harness {
        services,
        store,
        clock,
        cache,
    }
}
