//! In-memory implementation of every storage trait.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Account, AccountStore, OperationLog, OperationLogSink, SubjectStore};
use crate::AuthResult;
use crate::error::AuthError;

#[derive(Debug, Default)]
struct State {
    inactive: HashMap<String, BTreeSet<i64>>,
    user_roles: HashMap<i64, BTreeSet<i64>>,
    role_permissions: HashMap<i64, Vec<String>>,
    menu_permissions: Vec<String>,
    accounts: HashMap<String, Account>,
    logins: Vec<(i64, String)>,
    operation_logs: Vec<OperationLog>,
}

/// In-memory store. Clones share state.
///
/// [`set_failing`](Self::set_failing) makes every read and write fail, which
/// is how tests exercise store outages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AuthResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AuthError::storage("in-memory store unavailable"))
        } else {
            Ok(())
        }
    }

    /// Flag or unflag a subject as inactive in `group` (lower-cased).
    pub async fn set_inactive(&self, group: &str, subject_id: i64, inactive: bool) {
        let mut state = self.state.write().await;
        let set = state.inactive.entry(group.to_lowercase()).or_default();
        if inactive {
            set.insert(subject_id);
        } else {
            set.remove(&subject_id);
        }
    }

    pub async fn assign_role(&self, subject_id: i64, role_id: i64) {
        self.state
            .write()
            .await
            .user_roles
            .entry(subject_id)
            .or_default()
            .insert(role_id);
    }

    pub async fn unassign_role(&self, subject_id: i64, role_id: i64) {
        if let Some(roles) = self.state.write().await.user_roles.get_mut(&subject_id) {
            roles.remove(&role_id);
        }
    }

    pub async fn grant(&self, role_id: i64, permission: &str) {
        self.state
            .write()
            .await
            .role_permissions
            .entry(role_id)
            .or_default()
            .push(permission.to_string());
    }

    pub async fn add_menu_permission(&self, permission: &str) {
        self.state
            .write()
            .await
            .menu_permissions
            .push(permission.to_string());
    }

    pub async fn add_account(&self, account: Account) {
        self.state
            .write()
            .await
            .accounts
            .insert(account.username.clone(), account);
    }

    /// Logins recorded so far as `(account id, ip)`.
    pub async fn logins(&self) -> Vec<(i64, String)> {
        self.state.read().await.logins.clone()
    }

    pub async fn operation_logs(&self) -> Vec<OperationLog> {
        self.state.read().await.operation_logs.clone()
    }
}

#[async_trait]
impl SubjectStore for InMemoryStore {
    async fn find_inactive_subject_ids(&self, group: &str) -> AuthResult<Vec<i64>> {
        self.check()?;
        Ok(self
            .state
            .read()
            .await
            .inactive
            .get(group)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn find_roles_for_subject(&self, subject_id: i64) -> AuthResult<Vec<i64>> {
        self.check()?;
        Ok(self
            .state
            .read()
            .await
            .user_roles
            .get(&subject_id)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn find_permissions_for_roles(&self, role_ids: &[i64]) -> AuthResult<Vec<String>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(role_ids
            .iter()
            .filter_map(|role| state.role_permissions.get(role))
            .flatten()
            .cloned()
            .collect())
    }

    async fn find_all_permissions(&self) -> AuthResult<Vec<String>> {
        self.check()?;
        Ok(self.state.read().await.menu_permissions.clone())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_account_by_username(&self, username: &str) -> AuthResult<Option<Account>> {
        self.check()?;
        Ok(self.state.read().await.accounts.get(username).cloned())
    }

    async fn record_login(&self, account_id: i64, ip: &str) -> AuthResult<()> {
        self.check()?;
        self.state
            .write()
            .await
            .logins
            .push((account_id, ip.to_string()));
        Ok(())
    }
}

#[async_trait]
impl OperationLogSink for InMemoryStore {
    async fn record(&self, entry: OperationLog) -> AuthResult<()> {
        self.check()?;
        self.state.write().await.operation_logs.push(entry);
        Ok(())
    }
}
