//! CLI command definitions and dispatch.

pub mod check;
pub mod group;
pub mod migrate;
pub mod policy;
pub mod session;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use warden_auth::rbac::{AuthorizationClient, Enforcer, FilePolicyAdapter};
use warden_auth::AuthenticationService;
use warden_core::config::{AppConfig, PolicyBackend};
use warden_core::context::IdentityContext;
use warden_core::result::AppResult;
use warden_database::traits::PolicyAdapter;
use warden_database::DatabasePool;

use crate::output::OutputFormat;

/// Warden: policy-based authorization and session authentication
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment; selects the `config/<env>.toml` overlay
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations and seed built-in rules
    Migrate,
    /// Policy rule management
    Policy(policy::PolicyArgs),
    /// Group membership management
    Group(group::GroupArgs),
    /// Decide a single access request
    Check(check::CheckArgs),
    /// User registration and login
    User(user::UserArgs),
    /// Session inspection
    Session(session::SessionArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Migrate => migrate::execute(config).await,
            Commands::Policy(args) => policy::execute(args, config, self.format).await,
            Commands::Group(args) => group::execute(args, config, self.format).await,
            Commands::Check(args) => check::execute(args, config).await,
            Commands::User(args) => user::execute(args, config, self.format).await,
            Commands::Session(args) => session::execute(args, config, self.format).await,
        }
    }
}

/// Helper: connect to the configured database.
pub async fn connect(config: &AppConfig) -> AppResult<DatabasePool> {
    DatabasePool::connect(&config.database).await
}

/// Helper: load the policy store from the configured backend.
pub async fn open_enforcer(config: &AppConfig, db: &DatabasePool) -> AppResult<Enforcer> {
    let adapter: Arc<dyn PolicyAdapter> = match config.policy.backend {
        PolicyBackend::Database => db.policies(),
        PolicyBackend::File => {
            info!(path = %config.policy.file, "Using file policy store");
            Arc::new(FilePolicyAdapter::new(&config.policy.file))
        }
    };
    Enforcer::from_adapter(adapter).await
}

/// Helper: build the authentication service, with its username filter
/// when enabled.
pub async fn open_auth(
    config: &AppConfig,
    db: &DatabasePool,
    enforcer: &Enforcer,
) -> AppResult<AuthenticationService> {
    let authz = AuthorizationClient::new(Arc::new(enforcer.clone()));
    let service = AuthenticationService::new(db.users(), db.sessions(), authz, &config.auth)?;

    let bloom = &config.auth.bloom;
    if bloom.enabled {
        service
            .load_bloom_filter(
                &IdentityContext::new(),
                bloom.min_capacity,
                bloom.false_positive_rate,
            )
            .await?;
    } else {
        info!("Username filter disabled");
    }
    Ok(service)
}
