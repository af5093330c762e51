//! HTTP middleware for authentication, authorization and auditing.
//!
//! ```ignore
//! let app = lemon_auth::middleware::protect(router, auth_state);
//! ```
//!
//! [`protect`] installs both layers on the router's routes so that the
//! authentication layer runs first.

mod auth;
mod context;
mod error;
mod extract;
mod permission;
mod route;
mod state;

pub use auth::authentication_middleware;
pub use context::CurrentUser;
pub use extract::{
    CLIENT_IP_HEADERS, TOKEN_COOKIE, TOKEN_QUERY_PARAM, client_ip, extract_bearer_token,
    extract_token,
};
pub use permission::permission_middleware;
pub use route::{AuthRequirement, PathPattern, RoutePolicy, RouteTable, first_segment};
pub use state::{AuthState, DEFAULT_MAX_AUDIT_BODY};

use axum::{Router, middleware::from_fn_with_state};

/// Install the authentication and permission layers on every route of
/// `router`.
pub fn protect<S>(router: Router<S>, state: AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(from_fn_with_state(state.clone(), permission_middleware))
        .route_layer(from_fn_with_state(state, authentication_middleware))
}
