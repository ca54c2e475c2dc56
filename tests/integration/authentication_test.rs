//! Integration tests for registration, login, and identity resolution.

mod helpers;

use chrono::Duration;
use uuid::Uuid;

use warden_core::context::IdentityContext;
use warden_core::error::ErrorKind;
use warden_database::SessionRepository;
use warden_entity::session::Session;

#[tokio::test]
async fn test_register_login_resolve_logout() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();

    let user = app.auth.register(&ctx, "alice", "password123").await.unwrap();
    let session = app.auth.login(&ctx, "alice", "password123").await.unwrap();

    let resolved = app
        .auth
        .resolve_identity(&ctx.with_session_id(session.id.as_str()))
        .await
        .unwrap();
    assert!(!resolved.stale_session);
    assert_eq!(resolved.context.subject(), user.subject());

    let current = app.auth.get_current_user(&resolved.context).await.unwrap();
    assert_eq!(current.username, "alice");
    assert!(current.password_hash.is_empty());

    app.auth.logout(&resolved.context, &session.id).await.unwrap();
    let resolved = app.auth.resolve_identity(&resolved.context).await.unwrap();
    assert!(resolved.stale_session);
    assert!(resolved.context.is_anonymous());
}

#[tokio::test]
async fn test_duplicate_registration_through_filter() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();
    app.auth.register(&ctx, "alice", "password123").await.unwrap();

    let loaded = app.auth.load_bloom_filter(&ctx, 1000, 0.01).await.unwrap();
    assert_eq!(loaded, 1);

    let err = app.auth.register(&ctx, "alice", "password456").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    assert_eq!(app.users.len(), 1);

    app.auth.register(&ctx, "bob", "password123").await.unwrap();
    assert_eq!(app.users.len(), 2);
}

#[tokio::test]
async fn test_duplicate_registration_through_storage() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();
    app.auth.register(&ctx, "alice", "password123").await.unwrap();

    let err = app.auth.register(&ctx, "alice", "password456").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn test_login_failures_are_identical() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();
    app.auth.register(&ctx, "alice", "password123").await.unwrap();

    let unknown = app.auth.login(&ctx, "mallory", "password123").await.unwrap_err();
    let wrong = app.auth.login(&ctx, "alice", "password124").await.unwrap_err();
    assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
    assert_eq!(unknown.kind, wrong.kind);
    assert_eq!(unknown.message, wrong.message);
}

#[tokio::test]
async fn test_expired_session_resolves_as_stale() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();
    let user = app.auth.register(&ctx, "alice", "password123").await.unwrap();

    let mut session = Session::new("old-session", user.id, Duration::days(30));
    session.created_at -= Duration::days(31);
    session.expires_at -= Duration::days(31);
    app.sessions.insert(&session).await.unwrap();

    let err = app.auth.get_session(&ctx, "old-session").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);

    app.sessions.insert(&session).await.unwrap();
    let resolved = app
        .auth
        .resolve_identity(&ctx.with_session_id("old-session"))
        .await
        .unwrap();
    assert!(resolved.stale_session);
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_get_user_strips_hash_and_reports_missing() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new();
    let user = app.auth.register(&ctx, "alice", "password123").await.unwrap();

    let fetched = app.auth.get_user(&ctx, user.id).await.unwrap();
    assert!(fetched.password_hash.is_empty());

    let err = app.auth.get_user(&ctx, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
