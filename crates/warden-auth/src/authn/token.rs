//! Session identifier generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Number of random bytes in a session identifier.
pub const SESSION_ID_BYTES: usize = 32;

/// Generates a session identifier: 32 bytes from the OS random source,
/// hex encoded to 64 characters.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(&bytes)
}

/// Lowercase hex encoding.
mod hex {
    /// Encode bytes to hex string.
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
