//! Login account queries against `lemon_user`.

use async_trait::async_trait;
use lemon_auth::{Account, AccountStore, AuthResult};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;

use crate::{PostgresStore, StorageError, StorageResult};

type AccountTuple = (i64, String, String, String, bool);

fn account_from_tuple(row: AccountTuple) -> Account {
    let (id, username, nickname, password_hash, enabled) = row;
    Account {
        id,
        username,
        nickname: (!nickname.is_empty()).then_some(nickname),
        password_hash,
        enabled,
    }
}

impl PostgresStore {
    /// Insert an account unless the username is taken, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty username or if the database fails.
    pub async fn ensure_account(
        &self,
        username: &str,
        nickname: &str,
        password_hash: &str,
    ) -> StorageResult<i64> {
        if username.trim().is_empty() {
            return Err(StorageError::invalid_input("username must not be empty"));
        }

        query(
            r#"
            INSERT INTO lemon_user (username, nickname, password)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(nickname)
        .bind(password_hash)
        .execute(self.pool())
        .await?;

        let id: i64 = query_scalar("SELECT id FROM lemon_user WHERE username = $1")
            .bind(username)
            .fetch_one(self.pool())
            .await?;

        Ok(id)
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn find_account_by_username(&self, username: &str) -> AuthResult<Option<Account>> {
        // soft-deleted rows are invisible to login
        let row: Option<AccountTuple> = query_as(
            r#"
            SELECT id, username, nickname, password, is_active
            FROM lemon_user
            WHERE username = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(StorageError::from)?;

        Ok(row.map(account_from_tuple))
    }

    async fn record_login(&self, account_id: i64, ip: &str) -> AuthResult<()> {
        let result = query(
            r#"
            UPDATE lemon_user
            SET last_login_ip = $2, last_login_time = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .bind(ip)
        .execute(self.pool())
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            tracing::warn!(account_id, "login recorded for unknown account");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_nickname_is_none() {
        let account = account_from_tuple((1, "admin".into(), String::new(), "hash".into(), true));
        assert_eq!(account.nickname, None);

        let account = account_from_tuple((2, "ops".into(), "Ops".into(), "hash".into(), false));
        assert_eq!(account.nickname.as_deref(), Some("Ops"));
        assert!(!account.enabled);
    }
}
