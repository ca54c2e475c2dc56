//! Registration, login, and session lifecycle.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use warden_core::config::AuthConfig;
use warden_core::context::{AUTHENTICATED, IdentityContext};
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_database::traits::{SessionRepository, UserRepository};
use warden_entity::session::Session;
use warden_entity::user::User;

use crate::bloom::BloomFilter;
use crate::password::{CredentialValidator, PasswordHasher};
use crate::rbac::AuthorizationClient;

use super::token::generate_session_id;

/// Outcome of resolving the session carried by a request.
#[derive(Debug, Clone)]
pub struct IdentityResolution {
    /// The context to continue the request with.
    pub context: IdentityContext,
    /// The request carried a session id that no longer resolves to a user;
    /// the delivery layer should clear it from the transport.
    pub stale_session: bool,
}

/// Credentials, sessions, and the identity behind a request.
pub struct AuthenticationService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    authz: AuthorizationClient,
    hasher: PasswordHasher,
    validator: CredentialValidator,
    session_duration: Duration,
    username_filter: RwLock<Option<Arc<BloomFilter>>>,
}

impl std::fmt::Debug for AuthenticationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("session_duration", &self.session_duration)
            .finish_non_exhaustive()
    }
}

impl AuthenticationService {
    /// Creates a service without a username filter; every registration
    /// consults storage until [`load_bloom_filter`](Self::load_bloom_filter)
    /// is called.
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        authz: AuthorizationClient,
        config: &AuthConfig,
    ) -> AppResult<Self> {
        let session_duration = i64::try_from(config.session_duration_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "Session duration of {} hours is out of range",
                    config.session_duration_hours
                ))
            })?;

        Ok(Self {
            users,
            sessions,
            authz,
            hasher: PasswordHasher::with_config(&config.argon2)?,
            validator: CredentialValidator::new(config),
            session_duration,
            username_filter: RwLock::new(None),
        })
    }

    async fn filter(&self) -> Option<Arc<BloomFilter>> {
        self.username_filter.read().await.clone()
    }

    /// Builds the username filter from every stored username and installs
    /// it, replacing any previous filter. Returns the number of usernames
    /// loaded.
    ///
    /// The filter is sized for `max(username count, min_capacity)` items.
    pub async fn load_bloom_filter(
        &self,
        ctx: &IdentityContext,
        min_capacity: usize,
        false_positive_rate: f64,
    ) -> AppResult<usize> {
        let usernames = ctx
            .bounded("list usernames", self.users.list_usernames())
            .await
            .map_err(|e| e.context("Failed to load usernames"))?;

        let filter = BloomFilter::new(usernames.len().max(min_capacity), false_positive_rate)?;
        for username in &usernames {
            filter.add(username).await;
        }

        info!(
            usernames = usernames.len(),
            bits = filter.bit_count(),
            hashes = filter.hash_count(),
            "Username filter loaded"
        );
        *self.username_filter.write().await = Some(Arc::new(filter));
        Ok(usernames.len())
    }

    /// Registers a new account and places it in the authenticated group.
    ///
    /// A name the filter reports as possibly taken is rejected without a
    /// storage round trip. Returns the user without its password hash.
    pub async fn register(
        &self,
        ctx: &IdentityContext,
        username: &str,
        password: &str,
    ) -> AppResult<User> {
        self.validator.validate(username, password)?;

        let filter = self.filter().await;
        if let Some(filter) = &filter {
            if filter.test(username).await {
                warn!(username, "Registration rejected: username possibly taken");
                return Err(username_taken(username));
            }
        }

        let password_hash = self.hasher.hash_password(password)?;
        let user = User::new(username, password_hash);

        match ctx.bounded("insert user", self.users.insert(&user)).await {
            Ok(()) => {}
            Err(e) if e.is(ErrorKind::AlreadyExists) => {
                if let Some(filter) = &filter {
                    filter.add(username).await;
                }
                warn!(username, "Registration rejected: username taken");
                return Err(username_taken(username));
            }
            Err(e) => return Err(e.context("Failed to register user")),
        }

        if let Some(filter) = &filter {
            filter.add(username).await;
        }

        self.authz
            .add_to_group(ctx, &user.subject(), &[AUTHENTICATED])
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Registered user could not join the authenticated group");
                e.context("Failed to register user")
            })?;

        info!(user_id = %user.id, username, "User registered");
        Ok(user.without_password())
    }

    /// Verifies credentials and issues a new session.
    ///
    /// An unknown username and a wrong password fail identically.
    pub async fn login(
        &self,
        ctx: &IdentityContext,
        username: &str,
        password: &str,
    ) -> AppResult<Session> {
        let user = ctx
            .bounded("find user", self.users.find_by_username(username))
            .await
            .map_err(|e| e.context("Failed to log in"))?;

        let Some(user) = user else {
            warn!(username, "Login failed");
            return Err(AppError::invalid_credentials());
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(username, "Login failed");
            return Err(AppError::invalid_credentials());
        }

        let session = Session::new(generate_session_id(), user.id, self.session_duration);
        ctx.bounded("insert session", self.sessions.insert(&session))
            .await
            .map_err(|e| e.context("Failed to create session"))?;

        info!(user_id = %user.id, expires_at = %session.expires_at, "User logged in");
        Ok(session)
    }

    /// Deletes a session. An unknown session is `NotFound`.
    pub async fn logout(&self, ctx: &IdentityContext, session_id: &str) -> AppResult<()> {
        let deleted = ctx
            .bounded("delete session", self.sessions.delete(session_id))
            .await
            .map_err(|e| e.context("Failed to log out"))?;

        if !deleted {
            return Err(AppError::not_found("session not found"));
        }
        info!("Session ended");
        Ok(())
    }

    /// Returns a live session.
    ///
    /// A missing session is `NotFound`; an expired one is `Expired` and is
    /// deleted on the way out.
    pub async fn get_session(&self, ctx: &IdentityContext, session_id: &str) -> AppResult<Session> {
        let session = ctx
            .bounded("find session", self.sessions.find(session_id))
            .await
            .map_err(|e| e.context("Failed to get session"))?
            .ok_or_else(|| AppError::not_found("session not found"))?;

        if session.is_expired() {
            debug!(user_id = %session.user_id, expires_at = %session.expires_at, "Session expired");
            if let Err(e) = ctx
                .bounded("delete session", self.sessions.delete(&session.id))
                .await
            {
                error!(error = %e, "Failed to delete expired session");
            }
            return Err(AppError::expired(format!(
                "session expired at {}",
                session.expires_at
            )));
        }

        Ok(session)
    }

    /// Returns a user, without its password hash.
    pub async fn get_user(&self, ctx: &IdentityContext, user_id: Uuid) -> AppResult<User> {
        ctx.bounded("find user", self.users.find(user_id))
            .await
            .map_err(|e| e.context("Failed to get user"))?
            .map(User::without_password)
            .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))
    }

    /// Returns the user behind the context subject.
    ///
    /// An anonymous context, or a subject that is not a user, is
    /// `NoCurrentUser`.
    pub async fn get_current_user(&self, ctx: &IdentityContext) -> AppResult<User> {
        if ctx.is_anonymous() {
            return Err(AppError::no_current_user());
        }
        let Ok(user_id) = Uuid::parse_str(ctx.subject()) else {
            return Err(AppError::no_current_user());
        };

        match self.get_user(ctx, user_id).await {
            Err(e) if e.is(ErrorKind::NotFound) => Err(AppError::no_current_user()),
            other => other,
        }
    }

    /// Resolves the session id carried by `ctx` to a subject.
    ///
    /// Without a session id the context is returned unchanged. A session
    /// that is missing, expired, or owned by a deleted user yields an
    /// anonymous context flagged as stale. Storage failures propagate.
    pub async fn resolve_identity(&self, ctx: &IdentityContext) -> AppResult<IdentityResolution> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(IdentityResolution {
                context: ctx.clone(),
                stale_session: false,
            });
        };

        let session = match self.get_session(ctx, session_id).await {
            Ok(session) => session,
            Err(e) if e.is(ErrorKind::NotFound) || e.is(ErrorKind::Expired) => {
                debug!(reason = %e.kind, "Discarding stale session");
                return Ok(stale(ctx));
            }
            Err(e) => return Err(e),
        };

        let user = ctx
            .bounded("find user", self.users.find(session.user_id))
            .await
            .map_err(|e| e.context("Failed to resolve session user"))?;

        let Some(user) = user else {
            warn!(user_id = %session.user_id, "Session belongs to a missing user");
            ctx.bounded("delete session", self.sessions.delete(&session.id))
                .await
                .map_err(|e| e.context("Failed to delete orphaned session"))?;
            return Ok(stale(ctx));
        };

        Ok(IdentityResolution {
            context: ctx.with_subject(user.subject()),
            stale_session: false,
        })
    }
}

fn stale(ctx: &IdentityContext) -> IdentityResolution {
    IdentityResolution {
        context: ctx.without_session(),
        stale_session: true,
    }
}

fn username_taken(username: &str) -> AppError {
    AppError::already_exists(format!("username '{username}' is already taken"))
}
