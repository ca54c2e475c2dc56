//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::user::User;

use crate::traits::UserRepository;

/// Unique constraint on `users.username`.
const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Whether `err` is a clash on the username, as opposed to any other
/// unique key such as the primary key.
fn is_username_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(USERNAME_CONSTRAINT)
        }
        _ => false,
    }
}

/// PostgreSQL-backed user storage.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, registered_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_username_conflict(&e) {
                AppError::already_exists(format!(
                    "user with username '{}' already exists",
                    user.username
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert user", e)
            }
        })?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, registered_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, registered_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
        })
    }

    async fn list_usernames(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT username FROM users")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list usernames", e))
    }
}
