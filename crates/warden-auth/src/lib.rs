//! # warden-auth
//!
//! The access-control core of Warden.
//!
//! ## Modules
//!
//! - `rbac`: policy store, enforcer, and the context-aware authorization client
//! - `bloom`: probabilistic username pre-filter
//! - `password`: Argon2id hashing and credential validation
//! - `authn`: registration, login, sessions, and identity resolution

pub mod authn;
pub mod bloom;
pub mod password;
pub mod rbac;

pub use authn::{AuthenticationService, IdentityResolution};
pub use bloom::BloomFilter;
pub use password::{CredentialValidator, PasswordHasher};
pub use rbac::{AuthorizationClient, AuthorizationProvider, Enforcer, PolicyStore};
