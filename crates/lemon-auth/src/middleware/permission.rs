//! Permission check and operation log middleware.
//!
//! Runs after [`authentication_middleware`](super::authentication_middleware).
//! Routes with a `permission` are refused with 403 unless the caller holds
//! it. Routes with an audit `description` have their request buffered
//! (up to `max_audit_body`) and an [`OperationLog`] written once the handler
//! has produced a response. A failed log write never affects the response.

use std::net::SocketAddr;

use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, MatchedPath, State},
    http::{Request, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::CurrentUser;
use super::extract::client_ip;
use super::state::AuthState;
use crate::error::AuthError;
use crate::http::ERROR_HEADER;
use crate::storage::OperationLog;

/// Enforces the route permission and records audited operations.
pub async fn permission_middleware(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());
    let policy = state
        .routes
        .lookup(request.method(), matched.as_deref(), &path)
        .clone();

    if policy.permission.is_none() && policy.description.is_none() {
        return next.run(request).await;
    }

    let Some(user) = request.extensions().get::<CurrentUser>().cloned() else {
        if policy.permission.is_some() {
            return AuthError::unauthorized("permission check without authenticated user")
                .into_response();
        }
        return next.run(request).await;
    };

    if let Some(permission) = policy.permission.as_deref()
        && !state.permissions.check_permission(user.id, permission).await
    {
        tracing::debug!(user_id = user.id, permission = %permission, "permission denied");
        return AuthError::forbidden(format!("missing permission {permission}")).into_response();
    }

    let Some(description) = policy.description else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let declared_len = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    let (body, captured) = if declared_len.is_some_and(|len| len > state.max_audit_body) {
        (body, String::new())
    } else {
        match to_bytes(body, state.max_audit_body).await {
            Ok(bytes) => {
                let captured = String::from_utf8_lossy(&bytes).into_owned();
                (Body::from(bytes), captured)
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to buffer request body");
                return AuthError::bad_request("request body too large or unreadable")
                    .into_response();
            }
        }
    };

    let ip = client_ip(
        &parts.headers,
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0),
    );
    let method = parts.method.to_string();
    let request = Request::from_parts(parts, body);

    let response = next.run(request).await;
    let success =
        response.status().is_success() && !response.headers().contains_key(ERROR_HEADER);

    let entry = OperationLog {
        user_id: user.id,
        username: user.username,
        nickname: user.nickname,
        path,
        method,
        description,
        ip,
        body: captured,
        success,
    };
    if let Err(e) = state.audit.record(entry).await {
        tracing::error!(error = %e, "failed to write operation log");
    }

    response
}
