//! Authentication middleware.
//!
//! For routes whose policy requires authentication:
//! 1. Extract the token (header, then `token` query, then `jwt-token` cookie)
//! 2. Pick the realm (policy override, or first path segment with several realms)
//! 3. Validate it through the [`TokenService`](crate::token::TokenService)
//! 4. Require a positive numeric subject id
//! 5. Insert [`CurrentUser`] into request extensions
//!
//! Every failure produces the same 401 response.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::CurrentUser;
use super::extract::extract_token;
use super::state::AuthState;
use crate::error::AuthError;

/// Validates the caller's token according to the route policy.
pub async fn authentication_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());
    let policy = state
        .routes
        .lookup(request.method(), matched.as_deref(), &path);

    if !policy.requires_auth() {
        return next.run(request).await;
    }

    let Some(token) = extract_token(request.headers(), request.uri()) else {
        return AuthError::unauthorized("missing token").into_response();
    };

    let realm = state.realm_for(policy, &path);
    let subject = match state.tokens.validate_and_get_subject(&token, realm).await {
        Ok(Some(subject)) => subject,
        Ok(None) => return AuthError::unauthorized("token rejected").into_response(),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "cannot validate token for request");
            return AuthError::unauthorized("realm unavailable").into_response();
        }
    };

    let Some(id) = subject.numeric_id() else {
        tracing::debug!(subject = %subject.id, "subject id is not a positive integer");
        return AuthError::unauthorized("invalid subject").into_response();
    };

    let realm_name = match state.tokens.realms().resolve(realm) {
        Ok(realm) => realm.name().to_string(),
        Err(e) => return AuthError::unauthorized(e.to_string()).into_response(),
    };

    request.extensions_mut().insert(CurrentUser {
        id,
        username: subject.username,
        nickname: subject.nickname,
        realm: realm_name,
    });

    next.run(request).await
}
