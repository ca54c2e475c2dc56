//! Context-aware authorization facade.
//!
//! Services receive an [`IdentityContext`] and ask the client whether its
//! subject may act; the client fills in the subject (anonymous when none
//! was resolved) and bounds every provider call by the context deadline.

use std::sync::Arc;

use tracing::{error, warn};

use warden_core::context::IdentityContext;
use warden_core::error::{AccessDenied, AppError};
use warden_core::result::AppResult;
use warden_entity::policy::{OBJECT_NONE, PolicyRule, normalize_object};

use super::provider::AuthorizationProvider;

/// Authorization entry point for request handlers and services.
#[derive(Clone)]
pub struct AuthorizationClient {
    provider: Arc<dyn AuthorizationProvider>,
}

impl std::fmt::Debug for AuthorizationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationClient").finish_non_exhaustive()
    }
}

impl AuthorizationClient {
    /// Creates a client over `provider`.
    pub fn new(provider: Arc<dyn AuthorizationProvider>) -> Self {
        Self { provider }
    }

    /// Succeeds if the context subject may perform `action`.
    ///
    /// A denial is an `AccessDenied` error carrying the refused request;
    /// see [`AppError::denied_request`].
    pub async fn check_access(
        &self,
        ctx: &IdentityContext,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> AppResult<()> {
        let subject = ctx.subject();
        let allowed = ctx
            .bounded(
                "authorization check",
                self.provider.enforce(subject, domain, object, action),
            )
            .await
            .map_err(|e| e.context("Failed to check authorization"))?;

        if allowed {
            return Ok(());
        }

        let denied = AccessDenied {
            subject: subject.to_string(),
            domain: domain.to_string(),
            object: Some(normalize_object(object))
                .filter(|o| *o != OBJECT_NONE)
                .map(str::to_string),
            action: action.to_string(),
        };
        warn!(subject, domain, ?object, action, "Access denied");
        Err(AppError::access_denied(denied))
    }

    /// Whether the context subject may perform `action`. Errors count as no.
    pub async fn can_i(
        &self,
        ctx: &IdentityContext,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> bool {
        self.can(ctx, ctx.subject(), domain, object, action).await
    }

    /// Whether `subject` may perform `action`. Errors count as no.
    pub async fn can(
        &self,
        ctx: &IdentityContext,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> bool {
        let result = ctx
            .bounded(
                "authorization check",
                self.provider.enforce(subject, domain, object, action),
            )
            .await;
        match result {
            Ok(allowed) => allowed,
            Err(e) => {
                error!(subject, domain, ?object, action, error = %e, "Authorization check failed");
                false
            }
        }
    }

    /// Grants `subject` each of `actions` on `object` in `domain`.
    pub async fn add_policy_for_subject(
        &self,
        ctx: &IdentityContext,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        actions: &[&str],
    ) -> AppResult<()> {
        let rules = rules_for(subject, domain, object, actions);
        ctx.bounded("add policies", self.provider.add_policies(rules))
            .await
            .map_err(|e| e.context("Failed to add policies"))
    }

    /// Revokes each of `actions` on `object` in `domain` from `subject`.
    pub async fn remove_policy_for_subject(
        &self,
        ctx: &IdentityContext,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        actions: &[&str],
    ) -> AppResult<()> {
        let rules = rules_for(subject, domain, object, actions);
        ctx.bounded("remove policies", self.provider.remove_policies(rules))
            .await
            .map_err(|e| e.context("Failed to remove policies"))
    }

    /// Adds `subject` to each of `groups`.
    pub async fn add_to_group(
        &self,
        ctx: &IdentityContext,
        subject: &str,
        groups: &[&str],
    ) -> AppResult<()> {
        let groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
        ctx.bounded("add to group", self.provider.add_to_group(subject, &groups))
            .await
            .map_err(|e| e.context("Failed to add subject to group"))
    }

    /// Removes `subject` from each of `groups`.
    pub async fn remove_from_group(
        &self,
        ctx: &IdentityContext,
        subject: &str,
        groups: &[&str],
    ) -> AppResult<()> {
        let groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
        ctx.bounded(
            "remove from group",
            self.provider.remove_from_group(subject, &groups),
        )
        .await
        .map_err(|e| e.context("Failed to remove subject from group"))
    }
}

fn rules_for(subject: &str, domain: &str, object: Option<&str>, actions: &[&str]) -> Vec<PolicyRule> {
    actions
        .iter()
        .map(|action| PolicyRule::new(subject, domain, object, *action))
        .collect()
}
