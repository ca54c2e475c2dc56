//! Group membership commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use warden_core::config::AppConfig;
use warden_core::result::AppResult;
use warden_entity::policy::GroupingRule;

use crate::output::{self, OutputFormat};

/// Arguments for group commands
#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Group subcommand
    #[command(subcommand)]
    pub command: GroupCommand,
}

/// Group subcommands
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Make a subject a member of a group
    Add {
        /// Joining subject or group
        member: String,
        /// Group being joined
        group: String,
    },
    /// Remove a subject from a group
    Remove {
        /// Leaving subject or group
        member: String,
        /// Group being left
        group: String,
    },
    /// Show every group a subject reaches, directly or transitively
    Show {
        /// Subject to inspect
        subject: String,
    },
}

/// Group display row
#[derive(Debug, Serialize, Tabled)]
struct GroupRow {
    /// Group name
    group: String,
}

/// Execute group commands
pub async fn execute(args: &GroupArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let db = super::connect(config).await?;
    let enforcer = super::open_enforcer(config, &db).await?;

    match &args.command {
        GroupCommand::Add { member, group } => {
            if enforcer
                .add_grouping_policy(GroupingRule::new(member.as_str(), group.as_str()))
                .await?
            {
                output::print_success(&format!("{member} joined {group}"));
            } else {
                output::print_warning(&format!("{member} is already in {group}"));
            }
        }
        GroupCommand::Remove { member, group } => {
            if enforcer
                .remove_grouping_policy(&GroupingRule::new(member.as_str(), group.as_str()))
                .await?
            {
                output::print_success(&format!("{member} left {group}"));
            } else {
                output::print_warning(&format!("{member} is not in {group}"));
            }
        }
        GroupCommand::Show { subject } => {
            let rows: Vec<GroupRow> = enforcer
                .groups_for(subject)
                .await
                .into_iter()
                .map(|group| GroupRow { group })
                .collect();
            output::print_list(&rows, format);
        }
    }

    db.close().await;
    Ok(())
}
