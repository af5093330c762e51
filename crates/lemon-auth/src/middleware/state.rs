//! Shared state for the auth middleware.

use std::sync::Arc;

use super::route::{RoutePolicy, RouteTable, first_segment};
use crate::permission::PermissionResolver;
use crate::storage::OperationLogSink;
use crate::token::TokenService;

/// Default cap on request bodies captured for the operation log.
pub const DEFAULT_MAX_AUDIT_BODY: usize = 64 * 1024;

/// State required by [`authentication_middleware`](super::authentication_middleware)
/// and [`permission_middleware`](super::permission_middleware).
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
///     // ... other state
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Token issuer/validator.
    pub tokens: Arc<TokenService>,

    /// Permission resolver for guarded routes.
    pub permissions: Arc<PermissionResolver>,

    /// Route policies.
    pub routes: Arc<RouteTable>,

    /// Destination of operation logs.
    pub audit: Arc<dyn OperationLogSink>,

    /// Largest request body captured for the operation log.
    pub max_audit_body: usize,
}

impl AuthState {
    pub fn new(
        tokens: Arc<TokenService>,
        permissions: Arc<PermissionResolver>,
        routes: RouteTable,
        audit: Arc<dyn OperationLogSink>,
    ) -> Self {
        Self {
            tokens,
            permissions,
            routes: Arc::new(routes),
            audit,
            max_audit_body: DEFAULT_MAX_AUDIT_BODY,
        }
    }

    #[must_use]
    pub fn with_max_audit_body(mut self, limit: usize) -> Self {
        self.max_audit_body = limit;
        self
    }

    /// Realm a request is validated against.
    ///
    /// An explicit policy realm wins. With several realms configured, the
    /// first path segment names the realm. Otherwise the default applies.
    pub fn realm_for<'a>(&self, policy: &'a RoutePolicy, path: &'a str) -> Option<&'a str> {
        if let Some(realm) = policy.realm.as_deref() {
            return Some(realm);
        }
        if self.tokens.realms().len() > 1 {
            return first_segment(path);
        }
        None
    }
}
