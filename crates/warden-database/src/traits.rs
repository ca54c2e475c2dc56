//! Storage contracts consumed by the access-control core.
//!
//! Lookups return `Ok(None)` for a missing record; the services decide how
//! a miss is reported. Errors are reserved for failing storage, except for
//! `ErrorKind::AlreadyExists`, which `UserRepository::insert` must return
//! when the username is taken.

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::policy::{GroupingRule, PolicyRule};
use warden_entity::session::Session;
use warden_entity::user::User;

/// Durable user storage.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a new user. A taken username fails with `AlreadyExists`.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Find a user by id.
    async fn find(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// List every registered username.
    async fn list_usernames(&self) -> AppResult<Vec<String>>;
}

/// Durable session storage.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Insert a new session.
    async fn insert(&self, session: &Session) -> AppResult<()>;

    /// Find a session by id, expired or not.
    async fn find(&self, id: &str) -> AppResult<Option<Session>>;

    /// Delete a session. Returns `false` if no such session existed.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Every rule held by a policy backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    /// Policy (`p`) rules.
    pub policies: Vec<PolicyRule>,
    /// Grouping (`g`) rules.
    pub groupings: Vec<GroupingRule>,
}

/// Durable backend of the policy store.
///
/// Writes are single-rule and must be durable when they return. Adding a
/// rule that is already stored, or removing one that is not, is not an
/// error.
#[async_trait]
pub trait PolicyAdapter: Send + Sync + 'static {
    /// Read every stored rule.
    async fn load(&self) -> AppResult<PolicySnapshot>;

    /// Persist a policy rule.
    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<()>;

    /// Delete a policy rule.
    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<()>;

    /// Persist a grouping rule.
    async fn add_grouping(&self, rule: &GroupingRule) -> AppResult<()>;

    /// Delete a grouping rule.
    async fn remove_grouping(&self, rule: &GroupingRule) -> AppResult<()>;
}
