//! Request-scoped identity context.
//!
//! An [`IdentityContext`] is created by the delivery layer for every inbound
//! request and passed explicitly down the call chain. It carries the session
//! identifier read from the transport, the subject resolved from that
//! session, and the caller's deadline. There is no process-wide "current
//! user".

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::AppError;
use crate::result::AppResult;

/// Subject used when no user has been resolved for the request.
pub const ANONYMOUS: &str = "system:anonymous";

/// Group every registered user joins at registration.
pub const AUTHENTICATED: &str = "system:authenticated";

/// Group the anonymous subject belongs to.
pub const UNAUTHENTICATED: &str = "system:unauthenticated";

/// Prefix of subjects that identify non-human callers.
pub const SERVICE_PREFIX: &str = "system:service:";

/// Builds the subject for a named internal service.
pub fn service_subject(service_name: &str) -> String {
    format!("{SERVICE_PREFIX}{service_name}")
}

/// Identity and deadline carried through one request.
///
/// The context is cheap to clone and immutable; the `with_*` constructors
/// return a new context derived from `self`.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    subject: Option<Arc<str>>,
    session_id: Option<Arc<str>>,
    deadline: Option<Instant>,
}

impl IdentityContext {
    /// Creates an empty context: anonymous, no session, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved subject, or [`ANONYMOUS`] when none is set.
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Returns whether the context resolves to the anonymous subject.
    pub fn is_anonymous(&self) -> bool {
        self.subject() == ANONYMOUS
    }

    /// Returns the session identifier read from the transport, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns the caller's deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a context whose subject is `subject`.
    pub fn with_subject(&self, subject: impl Into<String>) -> Self {
        Self {
            subject: Some(Arc::from(subject.into())),
            ..self.clone()
        }
    }

    /// Returns a context whose subject is the named internal service.
    pub fn with_service_subject(&self, service_name: &str) -> Self {
        self.with_subject(service_subject(service_name))
    }

    /// Returns a context carrying `session_id`.
    pub fn with_session_id(&self, session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(Arc::from(session_id.into())),
            ..self.clone()
        }
    }

    /// Returns an anonymous context without a session, keeping the deadline.
    pub fn without_session(&self) -> Self {
        Self {
            subject: None,
            session_id: None,
            deadline: self.deadline,
        }
    }

    /// Returns a context bounded by `deadline`.
    ///
    /// An earlier deadline already present on the context wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Awaits `fut`, failing with `DeadlineExceeded` if the context deadline
    /// passes first. Without a deadline the future runs unbounded.
    pub async fn bounded<T, F>(&self, what: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| AppError::deadline_exceeded(format!("Deadline exceeded: {what}")))?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_context_is_anonymous() {
        let ctx = IdentityContext::new();
        assert_eq!(ctx.subject(), ANONYMOUS);
        assert!(ctx.is_anonymous());
        assert_eq!(ctx.session_id(), None);
    }

    #[test]
    fn test_with_subject_and_session() {
        let ctx = IdentityContext::new()
            .with_session_id("abc")
            .with_subject("user-1");
        assert_eq!(ctx.subject(), "user-1");
        assert_eq!(ctx.session_id(), Some("abc"));
        assert!(!ctx.is_anonymous());

        let cleared = ctx.without_session();
        assert!(cleared.is_anonymous());
        assert_eq!(cleared.session_id(), None);
    }

    #[test]
    fn test_service_subject_is_namespaced() {
        let ctx = IdentityContext::new().with_service_subject("mailer");
        assert_eq!(ctx.subject(), "system:service:mailer");
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = IdentityContext::new()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let ctx = IdentityContext::new().with_deadline(Instant::now() + Duration::from_millis(10));
        let err = ctx
            .bounded("slow call", async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_bounded_without_deadline_passes_through() {
        let ctx = IdentityContext::new();
        let value = ctx.bounded("fast call", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
