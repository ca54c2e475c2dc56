//! Unified application error types for Warden.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Callers branch on [`ErrorKind`];
//! the message is for humans and logs.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested user, session, or rule was not found.
    NotFound,
    /// A record with the same unique key already exists.
    AlreadyExists,
    /// The session exists but its expiry time has passed.
    Expired,
    /// Username or password did not match. Deliberately says nothing more.
    InvalidCredentials,
    /// The identity context carries no authenticated subject.
    NoCurrentUser,
    /// No policy grants the requested access.
    AccessDenied,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A filesystem I/O error occurred.
    Io,
    /// The caller's deadline passed before the operation finished.
    DeadlineExceeded,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Returns whether this kind describes a failing collaborator rather
    /// than a normal negative outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database | Self::Configuration | Self::Io | Self::DeadlineExceeded | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::NoCurrentUser => write!(f, "NO_CURRENT_USER"),
            Self::AccessDenied => write!(f, "ACCESS_DENIED"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Io => write!(f, "IO"),
            Self::DeadlineExceeded => write!(f, "DEADLINE_EXCEEDED"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The request tuple that was refused, kept for audit logging.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessDenied {
    /// Subject the decision was made for.
    pub subject: String,
    /// Policy domain.
    pub domain: String,
    /// Requested object, if any.
    pub object: Option<String>,
    /// Requested action.
    pub action: String,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => write!(
                f,
                "access denied for subject '{}' and domain '{}' and object '{}' and action '{}'",
                self.subject, self.domain, object, self.action
            ),
            None => write!(
                f,
                "access denied for subject '{}' and domain '{}' and action '{}'",
                self.subject, self.domain, self.action
            ),
        }
    }
}

impl std::error::Error for AccessDenied {}

/// The unified application error used throughout Warden.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap this error with additional context, keeping its kind.
    pub fn context(self, message: impl fmt::Display) -> Self {
        let kind = self.kind;
        Self::with_source(kind, format!("{message}: {}", self.message), self)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    /// Create an expired error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create the generic invalid-credentials error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "invalid credentials")
    }

    /// Create the no-current-user error.
    pub fn no_current_user() -> Self {
        Self::new(ErrorKind::NoCurrentUser, "current user not found")
    }

    /// Create an access-denied error carrying the refused request.
    pub fn access_denied(denied: AccessDenied) -> Self {
        let message = denied.to_string();
        Self::with_source(ErrorKind::AccessDenied, message, denied)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a deadline-exceeded error.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeadlineExceeded, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the refused request if this is an access-denied error,
    /// looking through any context wrapping.
    pub fn denied_request(&self) -> Option<&AccessDenied> {
        let mut current: Option<&(dyn std::error::Error + 'static)> = self
            .source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static));

        while let Some(err) = current {
            if let Some(denied) = err.downcast_ref::<AccessDenied>() {
                return Some(denied);
            }
            current = err.source();
        }
        None
    }

    /// Check the error kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
