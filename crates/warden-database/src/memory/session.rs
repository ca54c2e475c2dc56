//! In-memory session repository.

use async_trait::async_trait;
use dashmap::DashMap;

use warden_core::result::AppResult;
use warden_entity::session::Session;

use crate::traits::SessionRepository;

/// Session storage held in memory.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<String, Session>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, session: &Session) -> AppResult<()> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.sessions.remove(id).is_some())
    }
}
