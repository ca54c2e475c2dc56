//! Credential checks applied before registration.

use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;

/// Validates usernames and passwords against configured limits.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    /// Minimum password length, in characters.
    min_password_length: usize,
    /// Maximum username length, in characters.
    max_username_length: usize,
}

impl CredentialValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_password_length: config.password_min_length,
            max_username_length: config.username_max_length,
        }
    }

    /// Validates a username and a password, reporting the first violation.
    pub fn validate(&self, username: &str, password: &str) -> AppResult<()> {
        self.validate_username(username)?;
        self.validate_password(password)
    }

    /// Validates a username.
    pub fn validate_username(&self, username: &str) -> AppResult<()> {
        if username.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }

        if username
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(AppError::validation(
                "Username must not contain whitespace or control characters",
            ));
        }

        if username.chars().count() > self.max_username_length {
            return Err(AppError::validation(format!(
                "Username must be at most {} characters long",
                self.max_username_length
            )));
        }

        Ok(())
    }

    /// Validates a password.
    pub fn validate_password(&self, password: &str) -> AppResult<()> {
        if password.chars().count() < self.min_password_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_password_length
            )));
        }
        Ok(())
    }
}

impl Default for CredentialValidator {
    fn default() -> Self {
        Self::new(&AuthConfig::default())
    }
}
