//! Authentication and authorization configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [[auth.realms]]
//! name = "admin"
//! secret = "change-me-to-a-long-random-secret-value"
//! issuer = "lemon"
//! audience = "lemon-admin"
//! lifetime_minutes = 120
//! sso = true
//!
//! [auth.permission]
//! super_admin_id = 1
//! inactive_ttl = "10m"
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum signing secret length in bytes (HS256 key size).
pub const MIN_SECRET_LEN: usize = 32;

/// Root authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signing realms. The first one is the default.
    pub realms: Vec<RealmConfig>,

    /// Permission resolution settings.
    pub permission: PermissionConfig,
}

/// A named signing and validation context.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RealmConfig {
    /// Realm name, matched case-insensitively.
    pub name: String,

    /// HMAC-SHA256 signing secret.
    pub secret: String,

    /// Value of the `iss` claim.
    pub issuer: String,

    /// Value of the `aud` claim.
    pub audience: String,

    /// Token lifetime in minutes.
    #[serde(default = "default_lifetime_minutes")]
    pub lifetime_minutes: u64,

    /// Allow at most one active token per subject.
    #[serde(default)]
    pub sso: bool,
}

fn default_lifetime_minutes() -> u64 {
    120
}

impl RealmConfig {
    /// Token lifetime as a duration.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_minutes.saturating_mul(60))
    }
}

impl std::fmt::Debug for RealmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmConfig")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_minutes", &self.lifetime_minutes)
            .field("sso", &self.sso)
            .finish()
    }
}

/// Where the permission flag lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagScope {
    /// Per-process flag; a refresh only invalidates the current instance.
    #[default]
    Local,
    /// Flag shared through the distributed tier.
    Shared,
}

/// Permission resolver and inactive-subject gate settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Subject that holds every permission.
    pub super_admin_id: i64,

    /// How long the inactive-subject list of a realm is cached.
    #[serde(with = "humantime_serde")]
    pub inactive_ttl: Duration,

    /// TTL of cached permission sets. Sets cached under an old flag are
    /// unreachable after a refresh and are dropped when this expires.
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Option<Duration>,

    /// Where the permission flag is stored.
    pub flag_scope: FlagScope,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            super_admin_id: 1,
            inactive_ttl: Duration::from_secs(10 * 60),
            cache_ttl: Some(Duration::from_secs(60 * 60)),
            flag_scope: FlagScope::Local,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no realm is configured or any realm is
    /// invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_realms(&self.realms)?;

        if self.permission.inactive_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.permission.inactive_ttl must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Validates a realm list: non-empty, unique names, usable secrets.
pub fn validate_realms(realms: &[RealmConfig]) -> Result<(), ConfigError> {
    if realms.is_empty() {
        return Err(ConfigError::Missing(
            "at least one auth realm must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for realm in realms {
        realm.validate()?;
        if !seen.insert(realm.name.to_lowercase()) {
            return Err(ConfigError::InvalidValue(format!(
                "duplicate realm name: '{}'",
                realm.name
            )));
        }
    }

    Ok(())
}

impl RealmConfig {
    /// Validates a single realm.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "realm name cannot be empty".to_string(),
            ));
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "realm '{}': secret must be at least {} bytes",
                self.name, MIN_SECRET_LEN
            )));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "realm '{}': issuer cannot be empty",
                self.name
            )));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "realm '{}': audience cannot be empty",
                self.name
            )));
        }
        if self.lifetime_minutes == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "realm '{}': lifetime_minutes must be greater than zero",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm(name: &str) -> RealmConfig {
        RealmConfig {
            name: name.to_string(),
            secret: "s".repeat(MIN_SECRET_LEN),
            issuer: "lemon".to_string(),
            audience: "lemon-admin".to_string(),
            lifetime_minutes: 30,
            sso: false,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = AuthConfig {
            realms: vec![realm("admin"), realm("app")],
            ..AuthConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_requires_a_realm() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_rejects_duplicate_names_case_insensitively() {
        let err = validate_realms(&[realm("admin"), realm("ADMIN")]).unwrap_err();
        assert!(err.to_string().contains("duplicate realm name"));
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut short = realm("admin");
        short.secret = "too-short".to_string();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_fields_and_zero_lifetime() {
        let mut r = realm("admin");
        r.issuer.clear();
        assert!(r.validate().is_err());

        let mut r = realm("admin");
        r.audience.clear();
        assert!(r.validate().is_err());

        let mut r = realm("admin");
        r.lifetime_minutes = 0;
        assert!(r.validate().is_err());

        assert!(realm("  ").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let text = format!("{:?}", realm("admin"));
        assert!(text.contains("<redacted>"));
        assert!(!text.contains(&"s".repeat(MIN_SECRET_LEN)));
    }

    #[test]
    fn test_permission_defaults() {
        let config = PermissionConfig::default();
        assert_eq!(config.super_admin_id, 1);
        assert_eq!(config.inactive_ttl, Duration::from_secs(600));
        assert_eq!(config.flag_scope, FlagScope::Local);
    }

    #[test]
    fn test_deserialize_realm_defaults() {
        let realm: RealmConfig = serde_json::from_str(
            r#"{"name":"admin","secret":"x","issuer":"i","audience":"a"}"#,
        )
        .unwrap();
        assert_eq!(realm.lifetime_minutes, 120);
        assert!(!realm.sso);
        assert_eq!(realm.lifetime(), Duration::from_secs(7200));
    }
}
