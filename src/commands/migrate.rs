//! Database migration and seeding.

use std::path::Path;

use tracing::info;

use warden_auth::rbac::{ensure_builtin_groups, load_into};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::migration::run_migrations;

use crate::output;

/// Run pending migrations, seed the built-in groups, and apply the
/// configured bootstrap policy file when it exists.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let db = super::connect(config).await?;
    run_migrations(db.pool()).await?;
    output::print_success("All migrations applied successfully.");

    let enforcer = super::open_enforcer(config, &db).await?;
    if ensure_builtin_groups(&enforcer).await? {
        output::print_success("Seeded built-in groups.");
    }

    match config.policy.bootstrap_file.as_deref() {
        Some(path) if Path::new(path).exists() => {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::from(e).context(format!("Failed to read bootstrap policy {path}"))
            })?;
            let report = load_into(&enforcer, &content).await?;
            output::print_success(&format!(
                "Bootstrap policy {path}: {} policies and {} groupings added, {} unchanged",
                report.policies_added, report.groupings_added, report.unchanged
            ));
        }
        Some(path) => info!(path, "Bootstrap policy file not found, skipping"),
        None => {}
    }

    db.close().await;
    Ok(())
}
