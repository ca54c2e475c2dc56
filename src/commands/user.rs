//! User registration and login commands.

use clap::{Args, Subcommand};

use warden_core::config::AppConfig;
use warden_core::context::IdentityContext;
use warden_core::error::AppError;
use warden_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a new account
    Register {
        /// Login name
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and print the new session
    Login {
        /// Login name
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
}

/// Execute user commands
pub async fn execute(args: &UserArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let db = super::connect(config).await?;
    let enforcer = super::open_enforcer(config, &db).await?;
    let auth = super::open_auth(config, &db, &enforcer).await?;
    let ctx = IdentityContext::new();

    match &args.command {
        UserCommand::Register { username, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
            };

            let user = auth.register(&ctx, username, &password).await?;
            output::print_record(
                &[
                    ("id", user.id.to_string()),
                    ("username", user.username),
                    ("registered_at", user.registered_at.to_rfc3339()),
                ],
                format,
            );
        }
        UserCommand::Login { username, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
            };

            let session = auth.login(&ctx, username, &password).await?;
            output::print_record(
                &[
                    ("session_id", session.id),
                    ("user_id", session.user_id.to_string()),
                    ("expires_at", session.expires_at.to_rfc3339()),
                ],
                format,
            );
        }
    }

    db.close().await;
    Ok(())
}
