//! Subject, role and permission lookups.

use async_trait::async_trait;

use crate::AuthResult;

/// Authoritative source of subject state.
///
/// Subject and role identifiers are the numeric primary keys of the user and
/// role tables.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Returns every subject flagged inactive in `group`.
    ///
    /// `group` is the lower-cased realm name.
    async fn find_inactive_subject_ids(&self, group: &str) -> AuthResult<Vec<i64>>;

    /// Returns the roles assigned to a subject.
    async fn find_roles_for_subject(&self, subject_id: i64) -> AuthResult<Vec<i64>>;

    /// Returns the permission strings granted to any of `role_ids`.
    ///
    /// Duplicates are allowed; callers de-duplicate.
    async fn find_permissions_for_roles(&self, role_ids: &[i64]) -> AuthResult<Vec<String>>;

    /// Returns every permission string defined by the menu table.
    ///
    /// Used to build the super-admin permission set.
    async fn find_all_permissions(&self) -> AuthResult<Vec<String>>;
}
