//! Integration tests for policy enforcement through the authorization client.

mod helpers;

use warden_auth::rbac::{load_into, parse_policy_csv};
use warden_core::context::{ANONYMOUS, AUTHENTICATED, IdentityContext, UNAUTHENTICATED};
use warden_core::error::ErrorKind;
use warden_database::memory::MemoryPolicyAdapter;
use warden_database::PolicyAdapter;

const BLOG_POLICY: &str = "\
# Blog access rules
p, system:unauthenticated, blog, -, read
p, system:authenticated, blog, -, comment
p, staff, blog, *, edit
p, admins, blog, -, configure
g, admins, staff
g, alice, admins
";

#[tokio::test]
async fn test_transitive_group_membership() {
    let app = helpers::TestApp::new().await;
    load_into(&app.enforcer, BLOG_POLICY).await.unwrap();

    let alice = IdentityContext::new().with_subject("alice");
    app.authz
        .check_access(&alice, "blog", Some("post-7"), "edit")
        .await
        .unwrap();
    app.authz
        .check_access(&alice, "blog", None, "configure")
        .await
        .unwrap();

    let bob = IdentityContext::new().with_subject("bob");
    let err = app
        .authz
        .check_access(&bob, "blog", Some("post-7"), "edit")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);
    assert_eq!(err.denied_request().unwrap().subject, "bob");
}

#[tokio::test]
async fn test_anonymous_requests_use_unauthenticated_group() {
    let app = helpers::TestApp::new().await;
    load_into(&app.enforcer, BLOG_POLICY).await.unwrap();

    let anonymous = IdentityContext::new();
    assert!(app.authz.can_i(&anonymous, "blog", None, "read").await);
    assert!(!app.authz.can_i(&anonymous, "blog", None, "comment").await);
    assert_eq!(app.enforcer.groups_for(ANONYMOUS).await, vec![UNAUTHENTICATED]);
}

#[tokio::test]
async fn test_registered_users_are_authenticated() {
    let app = helpers::TestApp::new().await;
    load_into(&app.enforcer, BLOG_POLICY).await.unwrap();

    let ctx = app.signed_in("carol").await;
    assert!(!ctx.is_anonymous());
    assert!(app.authz.can_i(&ctx, "blog", None, "comment").await);
    assert!(!app.authz.can_i(&ctx, "blog", Some("post-1"), "edit").await);
    assert_eq!(app.enforcer.groups_for(ctx.subject()).await, vec![AUTHENTICATED]);

    app.authz
        .add_to_group(&ctx, ctx.subject(), &["staff"])
        .await
        .unwrap();
    assert!(app.authz.can_i(&ctx, "blog", Some("post-1"), "edit").await);
}

#[tokio::test]
async fn test_reloading_policy_source_changes_nothing() {
    let app = helpers::TestApp::new().await;
    load_into(&app.enforcer, BLOG_POLICY).await.unwrap();
    let policies = app.policies.policy_count();
    let groupings = app.policies.grouping_count();

    let report = load_into(&app.enforcer, BLOG_POLICY).await.unwrap();
    assert_eq!(report.policies_added, 0);
    assert_eq!(report.groupings_added, 0);
    assert_eq!(app.policies.policy_count(), policies);
    assert_eq!(app.policies.grouping_count(), groupings);
}

#[tokio::test]
async fn test_rules_persist_to_adapter() {
    let app = helpers::TestApp::new().await;
    let ctx = IdentityContext::new().with_service_subject("indexer");
    app.authz
        .add_policy_for_subject(&ctx, ctx.subject(), "search", None, &["reindex", "query"])
        .await
        .unwrap();

    let stored = app.policies.load().await.unwrap();
    assert_eq!(stored.policies.len(), 2);
    assert!(stored.policies.iter().all(|p| p.subject == "system:service:indexer"));

    let reopened =
        helpers::TestApp::with_policies(MemoryPolicyAdapter::with_snapshot(stored)).await;
    assert!(reopened.authz.can_i(&ctx, "search", None, "reindex").await);

    reopened
        .authz
        .remove_policy_for_subject(&ctx, ctx.subject(), "search", None, &["reindex"])
        .await
        .unwrap();
    assert!(!reopened.authz.can_i(&ctx, "search", None, "reindex").await);
    assert!(reopened.authz.can_i(&ctx, "search", None, "query").await);
}

#[tokio::test]
async fn test_bootstrap_policy_file_parses() {
    let content = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/policy/default.csv"
    ))
    .unwrap();
    let snapshot = parse_policy_csv(&content).unwrap();
    assert!(snapshot
        .groupings
        .iter()
        .any(|g| g.member == ANONYMOUS && g.group == UNAUTHENTICATED));
}
