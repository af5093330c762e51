//! PostgreSQL storage backend for lemon-auth.
//!
//! Provides persistent storage for:
//!
//! - Inactive subjects per realm group (`lemon_inactive_user`)
//! - Subject roles and role permissions (`lemon_user_role`, `lemon_role_permission`)
//! - Menu permissions, used for the super-admin set (`lemon_menu`)
//! - Login accounts (`lemon_user`)
//! - Operation logs (`lemon_operation_log`)
//!
//! # Example
//!
//! ```ignore
//! use lemon_auth_postgres::PostgresStore;
//!
//! let store = PostgresStore::connect("postgres://localhost/lemon", 10).await?;
//! store.migrate().await?;
//! let roles = store.find_roles_for_subject(7).await?;
//! ```

pub mod account;
pub mod migrations;
pub mod operation_log;
pub mod subject;

use std::sync::Arc;
use std::time::Duration;

use lemon_auth::AuthError;
use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// Create a `Migration` error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if this is an invalid input error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidInput(message) => AuthError::bad_request(message),
            other => AuthError::storage(other.to_string()),
        }
    }
}

// =============================================================================
// PostgreSQL Store
// =============================================================================

/// PostgreSQL implementation of the lemon-auth storage traits.
///
/// Implements [`SubjectStore`](lemon_auth::SubjectStore),
/// [`AccountStore`](lemon_auth::AccountStore) and
/// [`OperationLogSink`](lemon_auth::OperationLogSink) over one pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    /// Create a store with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a store by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str, pool_size: u32) -> StorageResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(pool_size.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        tracing::info!(pool_size, "connected to PostgreSQL");
        Ok(Self::new(Arc::new(pool)))
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_maps_to_auth_error() {
        let auth: AuthError = StorageError::invalid_input("bad id").into();
        assert!(auth.is_client_error());

        let auth: AuthError = StorageError::migration("boom").into();
        assert!(auth.is_server_error());
        assert!(auth.to_string().contains("boom"));
    }

    #[test]
    fn test_predicates() {
        assert!(StorageError::invalid_input("x").is_invalid_input());
        assert!(!StorageError::migration("x").is_database_error());
    }
}
