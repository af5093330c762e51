//! End-to-end tests of the server router with the in-memory store.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use lemon_auth::{Account, InMemoryStore, RealmConfig, password::hash_password};
use lemon_cache::HybridCache;
use lemon_server::{
    AppState, build_app,
    config::AppConfig,
    server::REFRESH_PERMISSION,
    state::Stores,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery staple";

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.realms = vec![RealmConfig {
        name: "admin".into(),
        secret: "server-test-secret-0123456789abcdef".into(),
        issuer: "lemon".into(),
        audience: "lemon-admin".into(),
        lifetime_minutes: 120,
        sso: true,
    }];
    cfg
}

async fn setup() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let hash = hash_password(PASSWORD).unwrap();
    store
        .add_account(Account {
            id: 1,
            username: "admin".into(),
            nickname: Some("Administrator".into()),
            password_hash: hash.clone(),
            enabled: true,
        })
        .await;
    store
        .add_account(Account {
            id: 7,
            username: "editor".into(),
            nickname: None,
            password_hash: hash.clone(),
            enabled: true,
        })
        .await;
    store
        .add_account(Account {
            id: 8,
            username: "retired".into(),
            nickname: None,
            password_hash: hash,
            enabled: false,
        })
        .await;

    let state = AppState::new(
        &config(),
        HybridCache::local_only(),
        Stores::in_memory(store.clone()),
    )
    .unwrap();
    (build_app(state), store)
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/admin/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", "198.51.100.23")
        .body(Body::from(
            json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(login_request(username, PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["code"], 0, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_healthz_is_public() {
    let (app, _) = setup().await;
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"], "local");
}

#[tokio::test]
async fn test_login_then_user_info() {
    let (app, store) = setup().await;
    let token = login(&app, "admin").await;

    let response = app
        .clone()
        .oneshot(authed(Method::GET, "/admin/auth/user-info", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["nickname"], "Administrator");
    assert_eq!(body["data"]["super_admin"], true);

    assert_eq!(store.logins().await, vec![(1, "198.51.100.23".to_string())]);
}

#[tokio::test]
async fn test_login_reports_lifetime() {
    let (app, _) = setup().await;
    let response = app
        .oneshot(login_request("editor", PASSWORD))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["expires_in"], 120 * 60);
}

#[tokio::test]
async fn test_bad_credentials_are_business_failures() {
    let (app, store) = setup().await;

    for request in [
        login_request("admin", "wrong"),
        login_request("nobody", PASSWORD),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-lemon-error"));
        let body = json_body(response).await;
        assert_eq!(body["code"], 1);
        assert_eq!(body["message"], "Invalid username or password");
    }
    assert!(store.logins().await.is_empty());
}

#[tokio::test]
async fn test_disabled_account_cannot_login() {
    let (app, _) = setup().await;
    let response = app
        .oneshot(login_request("retired", PASSWORD))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["message"], "Account is disabled");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (app, _) = setup().await;
    let token = login(&app, "editor").await;

    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/admin/auth/logout", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["code"], 0);

    let response = app
        .oneshot(authed(Method::GET, "/admin/auth/user-info", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_second_login_supersedes_first() {
    let (app, _) = setup().await;
    let first = login(&app, "editor").await;
    let second = login(&app, "editor").await;

    let response = app
        .clone()
        .oneshot(authed(Method::GET, "/admin/auth/user-info", &first))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(authed(Method::GET, "/admin/auth/user-info", &second))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_permissions_endpoint() {
    let (app, store) = setup().await;
    store.assign_role(7, 2).await;
    store.grant(2, "content.edit").await;
    store.grant(2, "content.view").await;
    let token = login(&app, "editor").await;

    let response = app
        .oneshot(authed(Method::GET, "/admin/auth/permissions", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"], json!(["content.edit", "content.view"]));
}

#[tokio::test]
async fn test_refresh_requires_permission_and_is_audited() {
    let (app, store) = setup().await;

    let editor = login(&app, "editor").await;
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/admin/auth/permissions/refresh", &editor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.operation_logs().await.is_empty());

    let admin = login(&app, "admin").await;
    let response = app
        .oneshot(authed(Method::POST, "/admin/auth/permissions/refresh", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["data"]["flag"].as_i64().unwrap() > 0);

    let logs = store.operation_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, 1);
    assert_eq!(logs[0].description, "Refresh permissions");
    assert!(logs[0].success);
}

#[tokio::test]
async fn test_refresh_grant_through_role() {
    let (app, store) = setup().await;
    let editor = login(&app, "editor").await;

    // cache the empty set, then grant and refresh
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/admin/auth/permissions/refresh", &editor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    store.assign_role(7, 5).await;
    store.grant(5, REFRESH_PERMISSION).await;
    let admin = login(&app, "admin").await;
    let response = app
        .clone()
        .oneshot(authed(Method::POST, "/admin/auth/permissions/refresh", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed(Method::POST, "/admin/auth/permissions/refresh", &editor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unlisted_route_is_not_found() {
    let (app, _) = setup().await;
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
