//! Realm registry: named signing contexts resolved by name.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};

use crate::AuthResult;
use crate::config::{ConfigError, RealmConfig, validate_realms};
use crate::error::AuthError;

/// A validated realm with its signing keys prepared.
pub struct Realm {
    config: RealmConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Realm {
    /// Build a realm from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: RealmConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;
        // Expiry is checked against the injected clock.
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    pub fn audience(&self) -> &str {
        &self.config.audience
    }

    pub fn lifetime(&self) -> Duration {
        self.config.lifetime()
    }

    pub fn sso_enabled(&self) -> bool {
        self.config.sso
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub(crate) fn validation(&self) -> &Validation {
        &self.validation
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// All configured realms. The first one is the default.
#[derive(Debug, Clone)]
pub struct RealmRegistry {
    realms: Vec<Arc<Realm>>,
}

impl RealmRegistry {
    /// Build the registry, failing fast on any invalid realm.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the list is empty, names collide, or any
    /// realm is invalid.
    pub fn new(configs: &[RealmConfig]) -> Result<Self, ConfigError> {
        validate_realms(configs)?;
        let realms = configs
            .iter()
            .cloned()
            .map(|config| Realm::new(config).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { realms })
    }

    /// Find a realm by name (case-insensitive); `None` selects the default.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RealmNotFound` for an unknown name.
    pub fn resolve(&self, name: Option<&str>) -> AuthResult<&Arc<Realm>> {
        match name {
            None => self.default_realm(),
            Some(name) => self
                .realms
                .iter()
                .find(|realm| realm.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| AuthError::realm_not_found(name)),
        }
    }

    /// The first configured realm.
    pub fn default_realm(&self) -> AuthResult<&Arc<Realm>> {
        self.realms
            .first()
            .ok_or_else(|| AuthError::configuration("no auth realm configured"))
    }

    /// Whether a realm with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.realms
            .iter()
            .any(|realm| realm.name().eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.realms.iter().map(|realm| realm.name())
    }
}
