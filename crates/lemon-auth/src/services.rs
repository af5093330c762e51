//! Wiring of the auth core from configuration.

use std::sync::Arc;

use lemon_cache::HybridCache;

use crate::clock::Clock;
use crate::config::{AuthConfig, ConfigError};
use crate::inactive::InactiveSubjectGate;
use crate::permission::PermissionResolver;
use crate::realm::RealmRegistry;
use crate::storage::SubjectStore;
use crate::token::TokenService;

/// The token service and permission resolver sharing one cache and store.
#[derive(Clone)]
pub struct AuthServices {
    pub tokens: Arc<TokenService>,
    pub permissions: Arc<PermissionResolver>,
}

impl AuthServices {
    /// Build every component, failing fast on invalid configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration does not validate.
    pub fn build(
        config: &AuthConfig,
        cache: HybridCache,
        store: Arc<dyn SubjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let realms = Arc::new(RealmRegistry::new(&config.realms)?);
        let inactive = InactiveSubjectGate::new(
            cache.clone(),
            Arc::clone(&store),
            config.permission.inactive_ttl,
        );
        let tokens = TokenService::new(realms, cache.clone(), inactive, Arc::clone(&clock));
        let permissions =
            PermissionResolver::new(cache, store, clock, config.permission.clone());

        Ok(Self {
            tokens: Arc::new(tokens),
            permissions: Arc::new(permissions),
        })
    }
}
