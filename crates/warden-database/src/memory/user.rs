//! In-memory user repository.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::user::User;

use crate::traits::UserRepository;

/// User storage held in memory.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    /// Users by id.
    users: DashMap<Uuid, User>,
    /// Username → id; doubles as the uniqueness constraint.
    usernames: DashMap<String, Uuid>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> AppResult<()> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::already_exists(format!(
                "user with username '{}' already exists",
                user.username
            ))),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(())
            }
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let Some(id) = self.usernames.get(username).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn list_usernames(&self) -> AppResult<Vec<String>> {
        Ok(self.usernames.iter().map(|e| e.key().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::error::ErrorKind;

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = MemoryUserRepository::new();
        let user = User::new("alice", "hash");
        repo.insert(&user).await.unwrap();

        assert_eq!(repo.find(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(repo.find_by_username("alice").await.unwrap(), Some(user));
        assert_eq!(repo.find_by_username("Alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = MemoryUserRepository::new();
        repo.insert(&User::new("alice", "h1")).await.unwrap();

        let err = repo.insert(&User::new("alice", "h2")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_list_usernames() {
        let repo = MemoryUserRepository::new();
        repo.insert(&User::new("alice", "h")).await.unwrap();
        repo.insert(&User::new("bob", "h")).await.unwrap();

        let mut names = repo.list_usernames().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    }
}
