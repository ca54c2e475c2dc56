//! Policy rule storage.
//!
//! Both rule kinds share one table, keyed by a row tag: `p` rows use all
//! four value columns, `g` rows use `v0` (member) and `v1` (group) and
//! leave the rest empty.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::policy::{GroupingRule, PolicyRule};

use crate::traits::{PolicyAdapter, PolicySnapshot};

const PTYPE_POLICY: &str = "p";
const PTYPE_GROUPING: &str = "g";

/// PostgreSQL-backed policy adapter.
#[derive(Debug, Clone)]
pub struct PgPolicyAdapter {
    pool: PgPool,
}

impl PgPolicyAdapter {
    /// Create a new policy adapter.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_row(&self, ptype: &str, values: [&str; 4]) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO policy_rules (ptype, v0, v1, v2, v3) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (ptype, v0, v1, v2, v3) DO NOTHING",
        )
        .bind(ptype)
        .bind(values[0])
        .bind(values[1])
        .bind(values[2])
        .bind(values[3])
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert policy rule", e))?;

        Ok(())
    }

    async fn delete_row(&self, ptype: &str, values: [&str; 4]) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM policy_rules \
             WHERE ptype = $1 AND v0 = $2 AND v1 = $3 AND v2 = $4 AND v3 = $5",
        )
        .bind(ptype)
        .bind(values[0])
        .bind(values[1])
        .bind(values[2])
        .bind(values[3])
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete policy rule", e))?;

        debug!(ptype, deleted = result.rows_affected(), "Deleted policy rows");
        Ok(())
    }
}

#[async_trait]
impl PolicyAdapter for PgPolicyAdapter {
    async fn load(&self) -> AppResult<PolicySnapshot> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT ptype, v0, v1, v2, v3 FROM policy_rules ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load policy rules", e))?;

        let mut snapshot = PolicySnapshot::default();
        for (ptype, v0, v1, v2, v3) in rows {
            match ptype.as_str() {
                PTYPE_POLICY => snapshot.policies.push(PolicyRule {
                    subject: v0,
                    domain: v1,
                    object: v2,
                    action: v3,
                }),
                PTYPE_GROUPING => snapshot.groupings.push(GroupingRule::new(v0, v1)),
                other => {
                    return Err(AppError::database(format!(
                        "Unknown policy row type '{other}' in policy_rules"
                    )));
                }
            }
        }

        Ok(snapshot)
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.insert_row(PTYPE_POLICY, rule.fields()).await
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.delete_row(PTYPE_POLICY, rule.fields()).await
    }

    async fn add_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.insert_row(PTYPE_GROUPING, [rule.member.as_str(), rule.group.as_str(), "", ""])
            .await
    }

    async fn remove_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.delete_row(PTYPE_GROUPING, [rule.member.as_str(), rule.group.as_str(), "", ""])
            .await
    }
}
