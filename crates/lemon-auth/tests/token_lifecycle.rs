//! End-to-end token lifecycle through the public API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{harness, harness_with_cache, realm};
use lemon_auth::SubjectInfo;
use lemon_cache::{HybridCache, LocalTier, MemoryTier};

#[tokio::test]
async fn test_admin_scenario_generate_validate_revoke() {
    let h = harness(vec![realm("admin", 30, false)]);
    let tokens = &h.services.tokens;

    let token = tokens.generate_token("42", Some("admin")).await.unwrap();
    let subject = tokens
        .validate_and_get_subject(&token, Some("admin"))
        .await
        .unwrap()
        .expect("valid token");
    assert_eq!(subject.id, "42");

    assert!(tokens.revoke_token(&token, Some("admin")).await.unwrap());
    assert!(
        tokens
            .validate_and_get_subject(&token, Some("admin"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_expiry_after_61_minutes() {
    let h = harness(vec![realm("admin", 1, false)]);
    let token = h.services.tokens.generate_token("42", None).await.unwrap();

    h.clock.advance(Duration::from_secs(61 * 60));
    assert!(
        h.services
            .tokens
            .validate_and_get_subject(&token, None)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_display_fields_round_trip() {
    let h = harness(vec![realm("admin", 30, false)]);
    let subject = SubjectInfo::new("7").with_username("alice").with_nickname("Alice");
    let token = h
        .services
        .tokens
        .generate_token(subject.clone(), None)
        .await
        .unwrap();

    let validated = h
        .services
        .tokens
        .validate_and_get_subject(&token, None)
        .await
        .unwrap();
    assert_eq!(validated, Some(subject));
}

#[tokio::test]
async fn test_sso_second_login_invalidates_first() {
    let h = harness(vec![realm("admin", 30, true)]);
    let tokens = &h.services.tokens;

    let first = tokens.generate_token("42", None).await.unwrap();
    let second = tokens.generate_token("42", None).await.unwrap();

    assert!(tokens.validate_and_get_subject(&first, None).await.unwrap().is_none());
    assert!(tokens.validate_and_get_subject(&second, None).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_inactive_subject_denied_after_cache_ttl() {
    let h = harness(vec![realm("admin", 30, false)]);
    let tokens = &h.services.tokens;
    let token = tokens.generate_token("42", None).await.unwrap();
    assert!(tokens.validate_and_get_subject(&token, None).await.unwrap().is_some());

    h.store.set_inactive("admin", 42, true).await;
    tokio::time::advance(Duration::from_secs(601)).await;

    assert!(tokens.validate_and_get_subject(&token, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_permission_refresh_recomputes() {
    let h = harness(vec![realm("admin", 30, false)]);
    let permissions = &h.services.permissions;
    h.store.assign_role(5, 1).await;
    h.store.grant(1, "system.menu.list").await;

    assert_eq!(
        permissions.get_user_permissions(5).await,
        vec!["system.menu.list".to_string()]
    );

    h.store.grant(1, "system.menu.edit").await;
    permissions.refresh().await;

    assert_eq!(
        permissions.get_user_permissions(5).await,
        vec!["system.menu.edit".to_string(), "system.menu.list".to_string()]
    );
}

#[tokio::test]
async fn test_super_admin_bypass() {
    let h = harness(vec![realm("admin", 30, false)]);
    assert!(
        h.services
            .permissions
            .check_permission(1, "any.permission.string")
            .await
    );
    assert!(
        !h.services
            .permissions
            .check_permission(2, "any.permission.string")
            .await
    );
}

#[tokio::test]
async fn test_revocation_visible_to_other_instance() {
    let shared = MemoryTier::new();
    let cache = |shared: &MemoryTier| {
        HybridCache::new(Arc::new(LocalTier::new()), Arc::new(shared.clone()))
    };
    let a = harness_with_cache(vec![realm("admin", 30, false)], cache(&shared));
    let b = harness_with_cache(vec![realm("admin", 30, false)], cache(&shared));

    let token = a.services.tokens.generate_token("42", None).await.unwrap();
    assert!(a.services.tokens.revoke_token(&token, None).await.unwrap());
    assert!(
        b.services
            .tokens
            .validate_and_get_subject(&token, None)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_invalid_config_fails_fast() {
    let mut bad = realm("admin", 30, false);
    bad.secret = "short".to_string();
    let config = lemon_auth::AuthConfig {
        realms: vec![bad],
        ..Default::default()
    };
    let result = lemon_auth::AuthServices::build(
        &config,
        HybridCache::local_only(),
        Arc::new(lemon_auth::InMemoryStore::new()),
        Arc::new(lemon_auth::SystemClock),
    );
    assert!(result.is_err());
}
