//! The authorization backend seen by [`AuthorizationClient`](super::client::AuthorizationClient).

use async_trait::async_trait;

use warden_core::result::AppResult;
use warden_entity::policy::PolicyRule;

/// Decision and mutation operations of a policy engine.
///
/// Mutations are idempotent: adding a present rule or removing an absent
/// one succeeds without change.
#[async_trait]
pub trait AuthorizationProvider: Send + Sync + 'static {
    /// Returns whether the request is allowed. `Ok(false)` is a denial;
    /// errors mean no decision could be made.
    async fn enforce(
        &self,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> AppResult<bool>;

    /// Adds each policy rule.
    async fn add_policies(&self, rules: Vec<PolicyRule>) -> AppResult<()>;

    /// Removes each policy rule.
    async fn remove_policies(&self, rules: Vec<PolicyRule>) -> AppResult<()>;

    /// Makes `member` a direct member of each group.
    async fn add_to_group(&self, member: &str, groups: &[String]) -> AppResult<()>;

    /// Removes `member` from each group.
    async fn remove_from_group(&self, member: &str, groups: &[String]) -> AppResult<()>;
}
