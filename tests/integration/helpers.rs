//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use warden_auth::rbac::{AuthorizationClient, Enforcer, ensure_builtin_groups};
use warden_auth::AuthenticationService;
use warden_core::config::{Argon2Config, AuthConfig};
use warden_core::context::IdentityContext;
use warden_database::memory::{MemoryPolicyAdapter, MemorySessionRepository, MemoryUserRepository};

/// A fully wired access-control stack over in-memory storage.
pub struct TestApp {
    /// Policy enforcer
    pub enforcer: Enforcer,
    /// Authorization facade over the enforcer
    pub authz: AuthorizationClient,
    /// Authentication service
    pub auth: AuthenticationService,
    /// Backing user store
    pub users: Arc<MemoryUserRepository>,
    /// Backing session store
    pub sessions: Arc<MemorySessionRepository>,
    /// Backing policy store
    pub policies: Arc<MemoryPolicyAdapter>,
}

impl TestApp {
    /// Create a new test application with the built-in groups seeded.
    pub async fn new() -> Self {
        Self::with_policies(MemoryPolicyAdapter::new()).await
    }

    /// Create a test application over pre-populated policy storage.
    pub async fn with_policies(policies: MemoryPolicyAdapter) -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let sessions = Arc::new(MemorySessionRepository::new());
        let policies = Arc::new(policies);

        let enforcer = Enforcer::from_adapter(policies.clone())
            .await
            .expect("Failed to load policies");
        ensure_builtin_groups(&enforcer)
            .await
            .expect("Failed to seed built-in groups");

        let authz = AuthorizationClient::new(Arc::new(enforcer.clone()));
        let auth = AuthenticationService::new(
            users.clone(),
            sessions.clone(),
            authz.clone(),
            &test_auth_config(),
        )
        .expect("Failed to build authentication service");

        Self {
            enforcer,
            authz,
            auth,
            users,
            sessions,
            policies,
        }
    }

    /// Register a user and return a context authenticated as them.
    pub async fn signed_in(&self, username: &str) -> IdentityContext {
        let ctx = IdentityContext::new();
        self.auth
            .register(&ctx, username, "password123")
            .await
            .expect("Failed to register test user");
        let session = self
            .auth
            .login(&ctx, username, "password123")
            .await
            .expect("Failed to log in test user");
        self.auth
            .resolve_identity(&ctx.with_session_id(session.id))
            .await
            .expect("Failed to resolve test session")
            .context
    }
}

/// Auth configuration with a cheap Argon2 cost.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        argon2: Argon2Config {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        },
        ..AuthConfig::default()
    }
}
