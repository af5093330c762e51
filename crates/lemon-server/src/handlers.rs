use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{Extensions, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use lemon_auth::{
    ApiResponse, AuthError, CurrentUser, SubjectInfo,
    middleware::{client_ip, extract_token},
    password::verify_password,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Realm that admin logins are issued in.
pub const ADMIN_REALM: &str = "admin";

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: String,
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let cache = if state.cache.is_distributed_available().await {
        state.cache.mode().to_string()
    } else {
        "local".to_string()
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            cache,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let Some(account) = state
        .accounts
        .find_account_by_username(&body.username)
        .await?
    else {
        tracing::debug!(username = %body.username, "login for unknown account");
        return Ok(ApiResponse::failure(INVALID_CREDENTIALS).into_response());
    };

    match verify_password(&body.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(username = %body.username, "wrong password");
            return Ok(ApiResponse::failure(INVALID_CREDENTIALS).into_response());
        }
        Err(e) => {
            tracing::error!(username = %body.username, error = %e, "stored password hash is unreadable");
            return Ok(ApiResponse::failure(INVALID_CREDENTIALS).into_response());
        }
    }

    if !account.enabled {
        return Ok(ApiResponse::failure("Account is disabled").into_response());
    }

    let mut subject = SubjectInfo::new(account.id.to_string()).with_username(&account.username);
    if let Some(ref nickname) = account.nickname {
        subject = subject.with_nickname(nickname);
    }
    let tokens = &state.services.tokens;
    let token = tokens.generate_token(subject, Some(ADMIN_REALM)).await?;
    let expires_in = tokens.realms().resolve(Some(ADMIN_REALM))?.lifetime().as_secs();

    let ip = client_ip(
        &headers,
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0),
    );
    if let Err(e) = state.accounts.record_login(account.id, &ip).await {
        tracing::warn!(account_id = account.id, error = %e, "failed to record login");
    }
    tracing::info!(account_id = account.id, ip = %ip, "login succeeded");

    Ok(ApiResponse::success(LoginResponse { token, expires_in }).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    uri: Uri,
) -> Result<ApiResponse<()>, AuthError> {
    let token = extract_token(&headers, &uri)
        .ok_or_else(|| AuthError::unauthorized("missing token"))?;
    let revoked = state
        .services
        .tokens
        .revoke_token(&token, Some(&user.realm))
        .await?;
    Ok(logout_response(revoked))
}

fn logout_response(revoked: bool) -> ApiResponse<()> {
    if revoked {
        ApiResponse::ok()
    } else {
        ApiResponse::failure("Logout failed")
    }
}

pub async fn permissions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResponse<Vec<String>> {
    ApiResponse::success(state.services.permissions.get_user_permissions(user.id).await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub realm: String,
    pub super_admin: bool,
}

pub async fn user_info(State(state): State<AppState>, user: CurrentUser) -> ApiResponse<UserInfo> {
    let super_admin = state.services.permissions.is_super_admin(user.id);
    ApiResponse::success(UserInfo {
        id: user.id,
        username: user.username,
        nickname: user.nickname,
        realm: user.realm,
        super_admin,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlagResponse {
    pub flag: i64,
}

/// Invalidate every cached permission set.
pub async fn refresh_permissions(State(state): State<AppState>) -> ApiResponse<FlagResponse> {
    let flag = state.services.permissions.refresh().await;
    ApiResponse::success(FlagResponse { flag })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_reports_unrevoked_token_as_failure() {
        assert!(logout_response(true).is_success());

        let failed = logout_response(false);
        assert!(!failed.is_success());
        assert_eq!(failed.code, 1);
        assert_eq!(failed.message, "Logout failed");
    }
}
