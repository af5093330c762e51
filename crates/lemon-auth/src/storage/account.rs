//! Login account lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// A user account as needed by the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    /// PHC-formatted Argon2 hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Disabled accounts cannot log in.
    pub enabled: bool,
}

/// Storage for login accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Finds an account by its (case-sensitive) username.
    async fn find_account_by_username(&self, username: &str) -> AuthResult<Option<Account>>;

    /// Records a successful login from `ip`.
    async fn record_login(&self, account_id: i64, ip: &str) -> AuthResult<()>;
}
