//! PostgreSQL repository implementations.

pub mod policy;
pub mod session;
pub mod user;

pub use policy::PgPolicyAdapter;
pub use session::PgSessionRepository;
pub use user::PgUserRepository;
