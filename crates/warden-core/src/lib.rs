//! # warden-core
//!
//! Core crate for Warden. Contains configuration schemas, the request-scoped
//! identity context, well-known policy subjects, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Warden crates.

pub mod config;
pub mod context;
pub mod error;
pub mod result;

pub use context::IdentityContext;
pub use error::{AccessDenied, AppError, ErrorKind};
pub use result::AppResult;
