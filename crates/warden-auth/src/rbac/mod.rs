//! Policy-based authorization.
//!
//! Rules are (subject, domain, object, action) tuples plus (member, group)
//! edges. A request is allowed when any rule matches the subject or one of
//! the groups it reaches transitively. There are no deny rules.

pub mod client;
pub mod enforcer;
pub mod file_adapter;
pub mod loader;
pub mod provider;
pub mod store;

pub use client::AuthorizationClient;
pub use enforcer::Enforcer;
pub use file_adapter::FilePolicyAdapter;
pub use loader::{LoadReport, ensure_builtin_groups, load_into, parse_policy_csv, render_policy_csv};
pub use provider::AuthorizationProvider;
pub use store::{PolicySet, PolicyStore};
