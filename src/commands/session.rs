//! Session inspection commands.

use clap::{Args, Subcommand};

use warden_core::config::AppConfig;
use warden_core::context::IdentityContext;
use warden_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Resolve a session to its user
    Show {
        /// Session ID
        id: String,
    },
    /// End a session
    Logout {
        /// Session ID
        id: String,
    },
}

/// Execute session commands
pub async fn execute(args: &SessionArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let db = super::connect(config).await?;
    let enforcer = super::open_enforcer(config, &db).await?;
    let auth = super::open_auth(config, &db, &enforcer).await?;

    match &args.command {
        SessionCommand::Show { id } => {
            let ctx = IdentityContext::new().with_session_id(id.as_str());
            let resolved = auth.resolve_identity(&ctx).await?;
            if resolved.stale_session {
                output::print_warning("Session is missing, expired, or orphaned");
            } else {
                let user = auth.get_current_user(&resolved.context).await?;
                let groups = enforcer.groups_for(resolved.context.subject()).await;
                output::print_record(
                    &[
                        ("session_id", id.clone()),
                        ("user_id", user.id.to_string()),
                        ("username", user.username),
                        ("groups", groups.join(", ")),
                    ],
                    format,
                );
            }
        }
        SessionCommand::Logout { id } => {
            auth.logout(&IdentityContext::new(), id).await?;
            output::print_success("Session ended");
        }
    }

    db.close().await;
    Ok(())
}
