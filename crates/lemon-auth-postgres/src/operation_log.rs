//! Operation log persistence.

use async_trait::async_trait;
use lemon_auth::{AuthResult, OperationLog, OperationLogSink};
use sqlx_core::query::query;

use crate::{PostgresStore, StorageError};

#[async_trait]
impl OperationLogSink for PostgresStore {
    async fn record(&self, entry: OperationLog) -> AuthResult<()> {
        query(
            r#"
            INSERT INTO lemon_operation_log
                (user_id, username, nickname, path, description, method, ip, body, success)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.username.unwrap_or_default())
        .bind(entry.nickname.unwrap_or_default())
        .bind(entry.path)
        .bind(entry.description)
        .bind(entry.method)
        .bind(entry.ip)
        .bind(entry.body)
        .bind(entry.success)
        .execute(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }
}
