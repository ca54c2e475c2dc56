//! In-memory storage backed by `dashmap`.
//!
//! These implementations honor the same contracts as the PostgreSQL
//! repositories (including username uniqueness) and are used by tests and
//! ephemeral runs. Nothing survives a restart.

pub mod policy;
pub mod session;
pub mod user;

pub use policy::MemoryPolicyAdapter;
pub use session::MemorySessionRepository;
pub use user::MemoryUserRepository;
