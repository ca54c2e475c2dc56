//! # warden-database
//!
//! Storage contracts consumed by the access-control core, with PostgreSQL
//! implementations for production and in-memory implementations for tests
//! and ephemeral runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

pub use connection::DatabasePool;
pub use traits::{PolicyAdapter, PolicySnapshot, SessionRepository, UserRepository};
