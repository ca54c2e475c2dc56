//! Policy and grouping rules.

use serde::{Deserialize, Serialize};

/// Object value of a domain-level rule, and of a request that names no object.
pub const OBJECT_NONE: &str = "-";

/// Object value that matches every object within the rule's domain.
pub const OBJECT_ANY: &str = "*";

/// Normalizes an optional request object to its stored form.
///
/// `None`, `""` and the literal [`OBJECT_NONE`] all name no object, so a
/// request for object `-` is a domain-level request.
pub fn normalize_object(object: Option<&str>) -> &str {
    match object {
        Some(o) if !o.is_empty() => o,
        _ => OBJECT_NONE,
    }
}

/// Grants `subject` the right to perform `action` on `object` in `domain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyRule {
    /// User id, group, or service subject the rule applies to.
    pub subject: String,
    /// Service or area the rule is scoped to.
    pub domain: String,
    /// Object id, [`OBJECT_ANY`], or [`OBJECT_NONE`].
    pub object: String,
    /// Action name.
    pub action: String,
}

impl PolicyRule {
    /// Builds a rule; a missing or empty object becomes [`OBJECT_NONE`].
    pub fn new(
        subject: impl Into<String>,
        domain: impl Into<String>,
        object: Option<&str>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            domain: domain.into(),
            object: normalize_object(object).to_string(),
            action: action.into(),
        }
    }

    /// Returns whether this rule's object covers the (normalized) requested object.
    pub fn covers_object(&self, requested: &str) -> bool {
        self.object == requested || self.object == OBJECT_ANY
    }

    /// The rule as stored fields: subject, domain, object, action.
    pub fn fields(&self) -> [&str; 4] {
        [&self.subject, &self.domain, &self.object, &self.action]
    }
}

/// Makes `member` a member of `group`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupingRule {
    /// Subject or group joining the group.
    pub member: String,
    /// Group being joined.
    pub group: String,
}

impl GroupingRule {
    /// Builds a grouping rule.
    pub fn new(member: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            group: group.into(),
        }
    }
}
