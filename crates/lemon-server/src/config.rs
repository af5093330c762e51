use std::net::SocketAddr;

use lemon_auth::AuthConfig;
use lemon_cache::{CacheConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Local cache and invalidation settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// PostgreSQL store; the in-memory store is used when absent
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
    /// Realms and permission settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Initial admin account
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.redis.enabled && self.redis.url.is_empty() {
            return Err("redis.enabled=true requires redis.url".into());
        }
        if self.cache.invalidation_channel.is_empty() {
            return Err("cache.invalidation_channel must not be empty".into());
        }
        if self.cache.sweep_interval.is_zero() {
            return Err("cache.sweep_interval must be > 0".into());
        }
        if let Some(ref pg) = self.postgres {
            if pg.url.is_empty() {
                return Err("postgres.url must not be empty".into());
            }
            if pg.pool_size == 0 {
                return Err("postgres.pool_size must be > 0".into());
            }
        }
        if let Some(ref admin) = self.bootstrap.admin_user
            && (admin.username.trim().is_empty() || admin.password.is_empty())
        {
            return Err("bootstrap.admin_user requires username and password".into());
        }
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Apply the embedded schema migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}
fn default_pool_size() -> u32 {
    10
}
fn default_run_migrations() -> bool {
    true
}

/// Bootstrap configuration, e.g.
/// - LEMON__BOOTSTRAP__ADMIN_USER__USERNAME
/// - LEMON__BOOTSTRAP__ADMIN_USER__PASSWORD
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    /// Created on startup unless the username already exists
    #[serde(default)]
    pub admin_user: Option<AdminUserConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub username: String,
    /// Plain text, hashed before it is stored
    pub password: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl std::fmt::Debug for AdminUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("nickname", &self.nickname)
            .finish()
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("lemon.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., LEMON__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("LEMON")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
