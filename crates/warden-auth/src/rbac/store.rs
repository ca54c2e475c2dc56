//! In-memory policy cache written through to a durable adapter.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use warden_core::result::AppResult;
use warden_database::traits::{PolicyAdapter, PolicySnapshot};
use warden_entity::policy::{GroupingRule, PolicyRule};

/// The rule relation held in memory.
///
/// Policies are kept ordered for stable listing; groupings are kept as an
/// adjacency map from member to the groups it directly belongs to.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    policies: BTreeSet<PolicyRule>,
    groups: HashMap<String, BTreeSet<String>>,
}

impl PolicySet {
    /// Builds the relation from stored rules, dropping duplicates.
    pub fn from_snapshot(snapshot: PolicySnapshot) -> Self {
        let mut set = Self::default();
        for rule in snapshot.policies {
            set.policies.insert(rule);
        }
        for rule in snapshot.groupings {
            set.insert_grouping(rule);
        }
        set
    }

    /// Whether the exact policy rule is present.
    pub fn contains_policy(&self, rule: &PolicyRule) -> bool {
        self.policies.contains(rule)
    }

    /// Whether the exact grouping edge is present.
    pub fn contains_grouping(&self, rule: &GroupingRule) -> bool {
        self.groups
            .get(&rule.member)
            .is_some_and(|groups| groups.contains(&rule.group))
    }

    fn insert_policy(&mut self, rule: PolicyRule) -> bool {
        self.policies.insert(rule)
    }

    fn remove_policy(&mut self, rule: &PolicyRule) -> bool {
        self.policies.remove(rule)
    }

    fn insert_grouping(&mut self, rule: GroupingRule) -> bool {
        self.groups.entry(rule.member).or_default().insert(rule.group)
    }

    fn remove_grouping(&mut self, rule: &GroupingRule) -> bool {
        let Some(groups) = self.groups.get_mut(&rule.member) else {
            return false;
        };
        let removed = groups.remove(&rule.group);
        if groups.is_empty() {
            self.groups.remove(&rule.member);
        }
        removed
    }

    /// Every policy rule, ordered.
    pub fn policies(&self) -> impl Iterator<Item = &PolicyRule> {
        self.policies.iter()
    }

    /// Every grouping edge, ordered by member then group.
    pub fn groupings(&self) -> Vec<GroupingRule> {
        let mut rules: Vec<GroupingRule> = self
            .groups
            .iter()
            .flat_map(|(member, groups)| {
                groups
                    .iter()
                    .map(move |group| GroupingRule::new(member.as_str(), group.as_str()))
            })
            .collect();
        rules.sort();
        rules
    }

    /// Number of policy rules.
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    /// Number of grouping edges.
    pub fn grouping_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// The subject plus every group reachable from it through grouping
    /// edges. Cycles are visited once.
    pub fn closure<'a>(&'a self, subject: &'a str) -> HashSet<&'a str> {
        let mut seen: HashSet<&str> = HashSet::from([subject]);
        let mut queue: VecDeque<&str> = VecDeque::from([subject]);

        while let Some(current) = queue.pop_front() {
            let Some(groups) = self.groups.get(current) else {
                continue;
            };
            for group in groups {
                if seen.insert(group.as_str()) {
                    queue.push_back(group.as_str());
                }
            }
        }
        seen
    }
}

/// Authoritative policy store: a cached [`PolicySet`] over a
/// [`PolicyAdapter`].
///
/// Mutations hold the write lock across the adapter write, so they are
/// serialized and the cache never runs ahead of durable storage.
pub struct PolicyStore {
    adapter: Arc<dyn PolicyAdapter>,
    rules: RwLock<PolicySet>,
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore").finish_non_exhaustive()
    }
}

impl PolicyStore {
    /// Loads every rule from the adapter.
    pub async fn load(adapter: Arc<dyn PolicyAdapter>) -> AppResult<Self> {
        let snapshot = adapter
            .load()
            .await
            .map_err(|e| e.context("Failed to load policies"))?;
        let rules = PolicySet::from_snapshot(snapshot);
        info!(
            policies = rules.policy_count(),
            groupings = rules.grouping_count(),
            "Policy store loaded"
        );
        Ok(Self {
            adapter,
            rules: RwLock::new(rules),
        })
    }

    /// Replaces the cache with a fresh read of the adapter.
    pub async fn reload(&self) -> AppResult<()> {
        let mut rules = self.rules.write().await;
        let snapshot = self
            .adapter
            .load()
            .await
            .map_err(|e| e.context("Failed to reload policies"))?;
        *rules = PolicySet::from_snapshot(snapshot);
        info!(
            policies = rules.policy_count(),
            groupings = rules.grouping_count(),
            "Policy store reloaded"
        );
        Ok(())
    }

    /// Shared read access to the cached relation.
    pub async fn read(&self) -> RwLockReadGuard<'_, PolicySet> {
        self.rules.read().await
    }

    /// Adds a policy rule. Returns `false` if it was already present.
    pub async fn add_policy(&self, rule: PolicyRule) -> AppResult<bool> {
        let mut rules = self.rules.write().await;
        if rules.contains_policy(&rule) {
            return Ok(false);
        }
        self.adapter
            .add_policy(&rule)
            .await
            .map_err(|e| e.context("Failed to persist policy"))?;
        debug!(subject = %rule.subject, domain = %rule.domain, object = %rule.object, action = %rule.action, "Policy added");
        Ok(rules.insert_policy(rule))
    }

    /// Removes a policy rule. Returns `false` if it was not present.
    pub async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let mut rules = self.rules.write().await;
        if !rules.contains_policy(rule) {
            return Ok(false);
        }
        self.adapter
            .remove_policy(rule)
            .await
            .map_err(|e| e.context("Failed to delete policy"))?;
        debug!(subject = %rule.subject, domain = %rule.domain, object = %rule.object, action = %rule.action, "Policy removed");
        Ok(rules.remove_policy(rule))
    }

    /// Adds a grouping edge. Returns `false` if it was already present.
    pub async fn add_grouping(&self, rule: GroupingRule) -> AppResult<bool> {
        let mut rules = self.rules.write().await;
        if rules.contains_grouping(&rule) {
            return Ok(false);
        }
        self.adapter
            .add_grouping(&rule)
            .await
            .map_err(|e| e.context("Failed to persist grouping"))?;
        debug!(member = %rule.member, group = %rule.group, "Grouping added");
        Ok(rules.insert_grouping(rule))
    }

    /// Removes a grouping edge. Returns `false` if it was not present.
    pub async fn remove_grouping(&self, rule: &GroupingRule) -> AppResult<bool> {
        let mut rules = self.rules.write().await;
        if !rules.contains_grouping(rule) {
            return Ok(false);
        }
        self.adapter
            .remove_grouping(rule)
            .await
            .map_err(|e| e.context("Failed to delete grouping"))?;
        debug!(member = %rule.member, group = %rule.group, "Grouping removed");
        Ok(rules.remove_grouping(rule))
    }
}
