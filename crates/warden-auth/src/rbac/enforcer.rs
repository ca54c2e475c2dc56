//! Policy enforcement: group closure plus rule matching.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::traits::PolicyAdapter;
use warden_entity::policy::{GroupingRule, PolicyRule, normalize_object};

use super::provider::AuthorizationProvider;
use super::store::{PolicySet, PolicyStore};

/// Decides (subject, domain, object, action) requests against the policy
/// store and exposes idempotent rule mutation.
#[derive(Debug, Clone)]
pub struct Enforcer {
    store: Arc<PolicyStore>,
}

impl Enforcer {
    /// Creates an enforcer over an already loaded store.
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }

    /// Loads a store from `adapter` and wraps it.
    pub async fn from_adapter(adapter: Arc<dyn PolicyAdapter>) -> AppResult<Self> {
        Ok(Self::new(Arc::new(PolicyStore::load(adapter).await?)))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Returns whether any rule grants the request.
    ///
    /// The subject matches through its transitive group closure. An omitted
    /// or empty object is the domain-level sentinel. No match is `Ok(false)`;
    /// a malformed request is an error.
    pub async fn enforce(
        &self,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> AppResult<bool> {
        require("subject", subject)?;
        require("domain", domain)?;
        require("action", action)?;

        let object = normalize_object(object);
        let rules = self.store.read().await;
        let allowed = evaluate(&rules, subject, domain, object, action);

        debug!(subject, domain, object, action, allowed, "Policy decision");
        Ok(allowed)
    }

    /// Adds a policy rule unless present. Returns whether it was added.
    pub async fn add_policy(&self, rule: PolicyRule) -> AppResult<bool> {
        validate_policy(&rule)?;
        self.store.add_policy(rule).await
    }

    /// Removes a policy rule if present. Returns whether it was removed.
    pub async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.store.remove_policy(rule).await
    }

    /// Adds a grouping edge unless present. Returns whether it was added.
    pub async fn add_grouping_policy(&self, rule: GroupingRule) -> AppResult<bool> {
        rule_field("member", &rule.member)?;
        rule_field("group", &rule.group)?;
        self.store.add_grouping(rule).await
    }

    /// Removes a grouping edge if present. Returns whether it was removed.
    pub async fn remove_grouping_policy(&self, rule: &GroupingRule) -> AppResult<bool> {
        self.store.remove_grouping(rule).await
    }

    /// Whether the exact policy rule is stored.
    pub async fn has_policy(&self, rule: &PolicyRule) -> bool {
        self.store.read().await.contains_policy(rule)
    }

    /// Whether the exact grouping edge is stored.
    pub async fn has_grouping_policy(&self, rule: &GroupingRule) -> bool {
        self.store.read().await.contains_grouping(rule)
    }

    /// Every policy rule, ordered.
    pub async fn policies(&self) -> Vec<PolicyRule> {
        self.store.read().await.policies().cloned().collect()
    }

    /// Every grouping edge, ordered.
    pub async fn grouping_policies(&self) -> Vec<GroupingRule> {
        self.store.read().await.groupings()
    }

    /// Every group `subject` belongs to, directly or transitively.
    pub async fn groups_for(&self, subject: &str) -> Vec<String> {
        let rules = self.store.read().await;
        let groups: BTreeSet<&str> = rules
            .closure(subject)
            .into_iter()
            .filter(|g| *g != subject)
            .collect();
        groups.into_iter().map(str::to_string).collect()
    }
}

fn evaluate(rules: &PolicySet, subject: &str, domain: &str, object: &str, action: &str) -> bool {
    let closure = rules.closure(subject);
    rules.policies().any(|rule| {
        rule.domain == domain
            && rule.action == action
            && rule.covers_object(object)
            && closure.contains(rule.subject.as_str())
    })
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::validation(format!("Policy {field} must not be empty")));
    }
    Ok(())
}

/// Stored rule fields must survive a trip through the policy file, which
/// trims fields and keeps one rule per line.
fn rule_field(field: &str, value: &str) -> AppResult<()> {
    require(field, value)?;
    if value.trim() != value {
        return Err(AppError::validation(format!(
            "Policy {field} must not start or end with whitespace"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(AppError::validation(format!(
            "Policy {field} must not contain control characters"
        )));
    }
    Ok(())
}

fn validate_policy(rule: &PolicyRule) -> AppResult<()> {
    rule_field("subject", &rule.subject)?;
    rule_field("domain", &rule.domain)?;
    rule_field("object", &rule.object)?;
    rule_field("action", &rule.action)
}

#[async_trait]
impl AuthorizationProvider for Enforcer {
    async fn enforce(
        &self,
        subject: &str,
        domain: &str,
        object: Option<&str>,
        action: &str,
    ) -> AppResult<bool> {
        Enforcer::enforce(self, subject, domain, object, action).await
    }

    async fn add_policies(&self, rules: Vec<PolicyRule>) -> AppResult<()> {
        for rule in rules {
            self.add_policy(rule).await?;
        }
        Ok(())
    }

    async fn remove_policies(&self, rules: Vec<PolicyRule>) -> AppResult<()> {
        for rule in &rules {
            self.remove_policy(rule).await?;
        }
        Ok(())
    }

    async fn add_to_group(&self, member: &str, groups: &[String]) -> AppResult<()> {
        for group in groups {
            self.add_grouping_policy(GroupingRule::new(member, group.as_str()))
                .await?;
        }
        Ok(())
    }

    async fn remove_from_group(&self, member: &str, groups: &[String]) -> AppResult<()> {
        for group in groups {
            self.remove_grouping_policy(&GroupingRule::new(member, group.as_str()))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::error::ErrorKind;
    use warden_database::memory::MemoryPolicyAdapter;
    use warden_database::traits::PolicySnapshot;
    use warden_entity::policy::OBJECT_ANY;

    async fn enforcer(policies: Vec<PolicyRule>, groupings: Vec<GroupingRule>) -> Enforcer {
        let adapter = MemoryPolicyAdapter::with_snapshot(PolicySnapshot {
            policies,
            groupings,
        });
        Enforcer::from_adapter(Arc::new(adapter)).await.unwrap()
    }

    #[tokio::test]
    async fn test_direct_rule() {
        let e = enforcer(vec![PolicyRule::new("alice", "blog", Some("post1"), "edit")], vec![]).await;
        assert!(e.enforce("alice", "blog", Some("post1"), "edit").await.unwrap());
        assert!(!e.enforce("alice", "blog", Some("post2"), "edit").await.unwrap());
        assert!(!e.enforce("alice", "blog", Some("post1"), "delete").await.unwrap());
        assert!(!e.enforce("alice", "wiki", Some("post1"), "edit").await.unwrap());
        assert!(!e.enforce("bob", "blog", Some("post1"), "edit").await.unwrap());
    }

    #[tokio::test]
    async fn test_transitive_groups() {
        let e = enforcer(
            vec![PolicyRule::new("staff", "blog", None, "publish")],
            vec![
                GroupingRule::new("alice", "admins"),
                GroupingRule::new("admins", "staff"),
            ],
        )
        .await;
        assert!(e.enforce("alice", "blog", None, "publish").await.unwrap());
        assert!(e.enforce("admins", "blog", None, "publish").await.unwrap());
        assert!(!e.enforce("bob", "blog", None, "publish").await.unwrap());
        assert_eq!(e.groups_for("alice").await, vec!["admins", "staff"]);
    }

    #[tokio::test]
    async fn test_group_cycle_terminates() {
        let e = enforcer(
            vec![],
            vec![GroupingRule::new("a", "b"), GroupingRule::new("b", "a")],
        )
        .await;
        assert!(!e.enforce("a", "d", None, "x").await.unwrap());
        assert_eq!(e.groups_for("a").await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_wildcard_object() {
        let e = enforcer(vec![PolicyRule::new("editor", "blog", Some(OBJECT_ANY), "edit")], vec![]).await;
        assert!(e.enforce("editor", "blog", Some("any-post"), "edit").await.unwrap());
        assert!(e.enforce("editor", "blog", None, "edit").await.unwrap());
    }

    #[tokio::test]
    async fn test_domain_level_rule_only_matches_omitted_object() {
        let e = enforcer(vec![PolicyRule::new("alice", "blog", None, "create")], vec![]).await;
        assert!(e.enforce("alice", "blog", None, "create").await.unwrap());
        assert!(e.enforce("alice", "blog", Some(""), "create").await.unwrap());
        assert!(!e.enforce("alice", "blog", Some("post1"), "create").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_request_is_error() {
        let e = enforcer(vec![], vec![]).await;
        for (s, d, a) in [("", "d", "x"), ("s", "", "x"), ("s", "d", "")] {
            let err = e.enforce(s, d, None, a).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_unstorable_fields_are_rejected() {
        let e = enforcer(vec![], vec![]).await;
        for rule in [
            PolicyRule::new(" alice", "blog", None, "edit"),
            PolicyRule::new("alice", "blog ", None, "edit"),
            PolicyRule::new("alice", "blog", Some("post\n1"), "edit"),
            PolicyRule::new("alice", "blog", None, "ed\tit"),
        ] {
            let err = e.add_policy(rule).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        let err = e
            .add_grouping_policy(GroupingRule::new("alice", "staff\r"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(e.policies().await.is_empty());

        assert!(e
            .add_policy(PolicyRule::new("alice", "blog", Some("post,1"), "edit"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_mutation() {
        let e = enforcer(vec![], vec![]).await;
        let rule = PolicyRule::new("alice", "blog", None, "post");
        assert!(e.add_policy(rule.clone()).await.unwrap());
        assert!(!e.add_policy(rule.clone()).await.unwrap());
        assert_eq!(e.policies().await.len(), 1);
        assert!(e.has_policy(&rule).await);

        let edge = GroupingRule::new("alice", "staff");
        assert!(e.add_grouping_policy(edge.clone()).await.unwrap());
        assert!(!e.add_grouping_policy(edge.clone()).await.unwrap());
        assert_eq!(e.grouping_policies().await, vec![edge.clone()]);

        assert!(e.remove_grouping_policy(&edge).await.unwrap());
        assert!(!e.remove_grouping_policy(&edge).await.unwrap());
        assert!(!e.has_grouping_policy(&edge).await);

        assert!(e.remove_policy(&rule).await.unwrap());
        assert!(!e.remove_policy(&rule).await.unwrap());
        assert!(e.policies().await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_batches() {
        let e = enforcer(vec![], vec![]).await;
        let provider: &dyn AuthorizationProvider = &e;
        let rules = vec![
            PolicyRule::new("bob", "blog", None, "read"),
            PolicyRule::new("bob", "blog", None, "write"),
        ];
        provider.add_policies(rules.clone()).await.unwrap();
        provider.add_policies(rules.clone()).await.unwrap();
        assert_eq!(e.policies().await.len(), 2);

        provider
            .add_to_group("bob", &["writers".to_string(), "readers".to_string()])
            .await
            .unwrap();
        assert_eq!(e.groups_for("bob").await, vec!["readers", "writers"]);

        provider
            .remove_from_group("bob", &["writers".to_string()])
            .await
            .unwrap();
        provider.remove_policies(rules).await.unwrap();
        assert_eq!(e.groups_for("bob").await, vec!["readers"]);
        assert!(e.policies().await.is_empty());
    }
}
