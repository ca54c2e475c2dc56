//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication, credential, and session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a session issued at login, in hours.
    #[serde(default = "default_session_duration")]
    pub session_duration_hours: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum username length.
    #[serde(default = "default_username_max")]
    pub username_max_length: usize,
    /// Argon2id cost parameters.
    #[serde(default)]
    pub argon2: Argon2Config,
    /// Username pre-filter used during registration.
    #[serde(default)]
    pub bloom: BloomConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_duration_hours: default_session_duration(),
            password_min_length: default_password_min(),
            username_max_length: default_username_max(),
            argon2: Argon2Config::default(),
            bloom: BloomConfig::default(),
        }
    }
}

/// Argon2id cost parameters.
///
/// The defaults match the `argon2` crate's recommended parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Bloom filter sizing for the username pre-filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Whether the filter is built at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lower bound on the expected item count used for sizing.
    #[serde(default = "default_min_capacity")]
    pub min_capacity: usize,
    /// Target false-positive rate, in `(0, 1)`.
    #[serde(default = "default_false_positive_rate")]
    pub false_positive_rate: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_capacity: default_min_capacity(),
            false_positive_rate: default_false_positive_rate(),
        }
    }
}

fn default_session_duration() -> u64 {
    30 * 24
}

fn default_password_min() -> usize {
    8
}

fn default_username_max() -> usize {
    64
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_min_capacity() -> usize {
    1000
}

fn default_false_positive_rate() -> f64 {
    0.01
}
