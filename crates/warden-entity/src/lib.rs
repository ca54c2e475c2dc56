//! # warden-entity
//!
//! Domain entity models for Warden. `User` and `Session` map to database
//! rows and derive `sqlx::FromRow`; policy rules are plain value objects
//! shared by the policy store, its adapters, and the enforcer.

pub mod policy;
pub mod session;
pub mod user;
