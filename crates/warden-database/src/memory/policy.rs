//! In-memory policy adapter.

use async_trait::async_trait;
use dashmap::DashSet;

use warden_core::result::AppResult;
use warden_entity::policy::{GroupingRule, PolicyRule};

use crate::traits::{PolicyAdapter, PolicySnapshot};

/// Policy backend held in memory.
#[derive(Debug, Default)]
pub struct MemoryPolicyAdapter {
    policies: DashSet<PolicyRule>,
    groupings: DashSet<GroupingRule>,
}

impl MemoryPolicyAdapter {
    /// Create an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter pre-populated with `snapshot`.
    pub fn with_snapshot(snapshot: PolicySnapshot) -> Self {
        let adapter = Self::new();
        for rule in snapshot.policies {
            adapter.policies.insert(rule);
        }
        for rule in snapshot.groupings {
            adapter.groupings.insert(rule);
        }
        adapter
    }

    /// Number of stored policy rules.
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    /// Number of stored grouping rules.
    pub fn grouping_count(&self) -> usize {
        self.groupings.len()
    }
}

#[async_trait]
impl PolicyAdapter for MemoryPolicyAdapter {
    async fn load(&self) -> AppResult<PolicySnapshot> {
        let mut policies: Vec<PolicyRule> = self.policies.iter().map(|r| r.key().clone()).collect();
        let mut groupings: Vec<GroupingRule> =
            self.groupings.iter().map(|r| r.key().clone()).collect();
        policies.sort();
        groupings.sort();
        Ok(PolicySnapshot {
            policies,
            groupings,
        })
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.policies.insert(rule.clone());
        Ok(())
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.policies.remove(rule);
        Ok(())
    }

    async fn add_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.groupings.insert(rule.clone());
        Ok(())
    }

    async fn remove_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.groupings.remove(rule);
        Ok(())
    }
}
