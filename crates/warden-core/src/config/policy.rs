//! Policy store configuration.

use serde::{Deserialize, Serialize};

/// Where the policy store persists its rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyBackend {
    /// The `policy_rules` table in the configured database.
    #[default]
    Database,
    /// A policy CSV file, rewritten on every mutation.
    File,
}

/// Where authorization rules come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Store backing the enforcer.
    #[serde(default)]
    pub backend: PolicyBackend,
    /// Rule file used when `backend = "file"`.
    #[serde(default = "default_file")]
    pub file: String,
    /// Policy file merged into the store at startup, rule by rule,
    /// skipping rules that already exist.
    #[serde(default = "default_bootstrap_file")]
    pub bootstrap_file: Option<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            backend: PolicyBackend::default(),
            file: default_file(),
            bootstrap_file: default_bootstrap_file(),
        }
    }
}

fn default_file() -> String {
    "policy/rules.csv".to_string()
}

fn default_bootstrap_file() -> Option<String> {
    Some("policy/default.csv".to_string())
}
