//! Single access decision.

use std::sync::Arc;

use clap::Args;

use warden_auth::rbac::AuthorizationClient;
use warden_core::config::AppConfig;
use warden_core::context::IdentityContext;
use warden_core::result::AppResult;

use crate::output;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Subject to decide for
    subject: String,
    /// Policy domain
    domain: String,
    /// Action name
    action: String,
    /// Object id; omit for a domain-level check
    #[arg(long)]
    object: Option<String>,
}

/// Decide the request; a denial exits non-zero.
pub async fn execute(args: &CheckArgs, config: &AppConfig) -> AppResult<()> {
    let db = super::connect(config).await?;
    let enforcer = super::open_enforcer(config, &db).await?;
    let client = AuthorizationClient::new(Arc::new(enforcer));

    let ctx = IdentityContext::new().with_subject(args.subject.as_str());
    let result = client
        .check_access(&ctx, &args.domain, args.object.as_deref(), &args.action)
        .await;
    db.close().await;

    result?;
    output::print_success("allowed");
    Ok(())
}
