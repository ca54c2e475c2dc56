//! Policy rule management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use warden_auth::rbac::{load_into, render_policy_csv};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::PolicySnapshot;
use warden_entity::policy::PolicyRule;

use crate::output::{self, OutputFormat};

/// Arguments for policy commands
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy subcommand
    #[command(subcommand)]
    pub command: PolicyCommand,
}

/// Policy subcommands
#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Add every rule of a policy CSV file that is not yet stored
    Load {
        /// Path to the policy file
        file: String,
    },
    /// List every rule
    List,
    /// Print every rule in policy CSV format
    Export,
    /// Grant an action
    Add(RuleArgs),
    /// Revoke an action
    Remove(RuleArgs),
}

/// A single policy rule
#[derive(Debug, Args)]
pub struct RuleArgs {
    /// User id, group, or service subject
    subject: String,
    /// Policy domain
    domain: String,
    /// Object id, `*` for any object, or `-` for a domain-level rule
    object: String,
    /// Action name
    action: String,
}

impl RuleArgs {
    fn rule(&self) -> PolicyRule {
        PolicyRule::new(
            self.subject.as_str(),
            self.domain.as_str(),
            Some(self.object.as_str()),
            self.action.as_str(),
        )
    }
}

/// Rule display row
#[derive(Debug, Serialize, Tabled)]
struct RuleRow {
    /// `p` for a policy, `g` for a grouping
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    kind: &'static str,
    /// Subject or member
    subject: String,
    /// Domain or group
    target: String,
    /// Object
    object: String,
    /// Action
    action: String,
}

/// Execute policy commands
pub async fn execute(args: &PolicyArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let db = super::connect(config).await?;
    let enforcer = super::open_enforcer(config, &db).await?;

    match &args.command {
        PolicyCommand::Load { file } => {
            let content = tokio::fs::read_to_string(file).await.map_err(|e| {
                AppError::from(e).context(format!("Failed to read policy file {file}"))
            })?;
            let report = load_into(&enforcer, &content).await?;
            output::print_success(&format!(
                "{} policies and {} groupings added, {} unchanged",
                report.policies_added, report.groupings_added, report.unchanged
            ));
        }
        PolicyCommand::List => {
            let mut rows: Vec<RuleRow> = enforcer
                .policies()
                .await
                .into_iter()
                .map(|p| RuleRow {
                    kind: "p",
                    subject: p.subject,
                    target: p.domain,
                    object: p.object,
                    action: p.action,
                })
                .collect();
            rows.extend(enforcer.grouping_policies().await.into_iter().map(|g| RuleRow {
                kind: "g",
                subject: g.member,
                target: g.group,
                object: String::new(),
                action: String::new(),
            }));
            output::print_list(&rows, format);
        }
        PolicyCommand::Export => {
            let snapshot = PolicySnapshot {
                policies: enforcer.policies().await,
                groupings: enforcer.grouping_policies().await,
            };
            print!("{}", render_policy_csv(&snapshot)?);
        }
        PolicyCommand::Add(rule) => {
            if enforcer.add_policy(rule.rule()).await? {
                output::print_success("Policy added");
            } else {
                output::print_warning("Policy already present");
            }
        }
        PolicyCommand::Remove(rule) => {
            if enforcer.remove_policy(&rule.rule()).await? {
                output::print_success("Policy removed");
            } else {
                output::print_warning("Policy not present");
            }
        }
    }

    db.close().await;
    Ok(())
}
