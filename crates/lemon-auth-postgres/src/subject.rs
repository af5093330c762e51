//! Subject store queries.

use async_trait::async_trait;
use lemon_auth::{AuthResult, SubjectStore};
use sqlx_core::query_scalar::query_scalar;

use crate::{PostgresStore, StorageError};

#[async_trait]
impl SubjectStore for PostgresStore {
    async fn find_inactive_subject_ids(&self, group: &str) -> AuthResult<Vec<i64>> {
        let ids: Vec<i64> = query_scalar(
            r#"
            SELECT user_id FROM lemon_inactive_user
            WHERE "group" = $1
            ORDER BY user_id
            "#,
        )
        .bind(group.to_lowercase())
        .fetch_all(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(ids)
    }

    async fn find_roles_for_subject(&self, subject_id: i64) -> AuthResult<Vec<i64>> {
        let roles: Vec<i64> = query_scalar(
            r#"
            SELECT role_id FROM lemon_user_role
            WHERE user_id = $1
            ORDER BY role_id
            "#,
        )
        .bind(subject_id)
        .fetch_all(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(roles)
    }

    async fn find_permissions_for_roles(&self, role_ids: &[i64]) -> AuthResult<Vec<String>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permissions: Vec<String> = query_scalar(
            r#"
            SELECT DISTINCT permission FROM lemon_role_permission
            WHERE role_id = ANY($1) AND permission <> ''
            "#,
        )
        .bind(role_ids)
        .fetch_all(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(permissions)
    }

    async fn find_all_permissions(&self) -> AuthResult<Vec<String>> {
        let permissions: Vec<String> = query_scalar(
            r#"
            SELECT DISTINCT permission FROM lemon_menu
            WHERE permission <> ''
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(permissions)
    }
}
