//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier. Its string form is the user's policy subject.
    pub id: Uuid,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Argon2 password hash. Empty once the record leaves the service.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// When the account was registered.
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user with a fresh identifier, registered now.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            registered_at: Utc::now(),
        }
    }

    /// The policy subject identifying this user.
    pub fn subject(&self) -> String {
        self.id.to_string()
    }

    /// Returns the record with the password hash cleared.
    pub fn without_password(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}
