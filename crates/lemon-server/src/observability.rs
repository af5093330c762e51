//! Log setup.
//!
//! The subscriber starts before the configuration is read, with `RUST_LOG` or
//! `info`. Once `logging.level` is known it is swapped in through the reload
//! handle, unless `RUST_LOG` was given.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Dependencies that are chatty at `debug` and below.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=warn", "h2=warn", "tower=warn"];

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let filter = if env_override() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level))
    } else {
        level_filter(level)
    };

    let (layer, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Switch to the configured level. Returns `false` when `RUST_LOG` takes
/// precedence or tracing was never initialised.
pub fn apply_logging_level(level: &str) -> bool {
    if env_override() {
        tracing::debug!("RUST_LOG is set, ignoring logging.level");
        return false;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    match handle.modify(|filter| *filter = level_filter(level)) {
        Ok(()) => {
            tracing::info!(level, "log level applied");
            true
        }
        Err(e) => {
            tracing::warn!(level, error = %e, "failed to apply log level");
            false
        }
    }
}

fn env_override() -> bool {
    std::env::var_os("RUST_LOG").is_some()
}

fn directives(level: &str) -> String {
    let mut out = level.to_ascii_lowercase();
    for target in QUIET_TARGETS {
        out.push(',');
        out.push_str(target);
    }
    out
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(directives(level)).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_quiet_dependencies() {
        assert_eq!(
            directives("DEBUG"),
            "debug,sqlx=warn,hyper=warn,h2=warn,tower=warn"
        );
    }

    #[test]
    fn test_every_config_level_parses() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(EnvFilter::try_new(directives(level)).is_ok(), "{level}");
        }
    }
}
