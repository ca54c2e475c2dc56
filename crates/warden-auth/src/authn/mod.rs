//! Session-based authentication.

pub mod service;
pub mod token;

pub use service::{AuthenticationService, IdentityResolution};
pub use token::generate_session_id;
