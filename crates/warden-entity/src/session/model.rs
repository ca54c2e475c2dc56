//! Session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A login session.
///
/// Sessions are created on login and deleted on logout. Expiry is never
/// stored as a state; it is derived from `expires_at` whenever the session
/// is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque, unguessable session identifier.
    pub id: String,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session for `user_id` that lasts `duration` from now.
    pub fn new(id: impl Into<String>, user_id: Uuid, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Check whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
