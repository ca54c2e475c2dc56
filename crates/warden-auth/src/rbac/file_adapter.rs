//! Policy adapter persisting rules to a policy CSV file.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::traits::{PolicyAdapter, PolicySnapshot};
use warden_entity::policy::{GroupingRule, PolicyRule};

use super::loader::{parse_policy_csv, render_policy_csv};

/// Stores rules in a CSV file that is rewritten on every mutation.
///
/// A missing file reads as an empty rule set. The rewrite goes through a
/// temporary sibling file and a rename, so readers never see a torn file.
#[derive(Debug)]
pub struct FilePolicyAdapter {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePolicyAdapter {
    /// Creates an adapter over `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> AppResult<PolicySnapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_policy_csv(&content)
                .map_err(|e| e.context(format!("Invalid policy file {}", self.path.display()))),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(PolicySnapshot::default()),
            Err(e) => Err(AppError::from(e).context(format!(
                "Failed to read policy file {}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, snapshot: &PolicySnapshot) -> AppResult<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, render_policy_csv(snapshot)?).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::from(e).context(format!(
                "Failed to replace policy file {}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), "Policy file rewritten");
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut PolicySnapshot) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.read().await?;
        if apply(&mut snapshot) {
            self.write(&snapshot).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyAdapter for FilePolicyAdapter {
    async fn load(&self) -> AppResult<PolicySnapshot> {
        self.read().await
    }

    async fn add_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.update(|s| {
            if s.policies.contains(rule) {
                return false;
            }
            s.policies.push(rule.clone());
            true
        })
        .await
    }

    async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<()> {
        self.update(|s| {
            let before = s.policies.len();
            s.policies.retain(|r| r != rule);
            s.policies.len() != before
        })
        .await
    }

    async fn add_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.update(|s| {
            if s.groupings.contains(rule) {
                return false;
            }
            s.groupings.push(rule.clone());
            true
        })
        .await
    }

    async fn remove_grouping(&self, rule: &GroupingRule) -> AppResult<()> {
        self.update(|s| {
            let before = s.groupings.len();
            s.groupings.retain(|r| r != rule);
            s.groupings.len() != before
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rbac::Enforcer;
    use warden_core::error::ErrorKind;

    fn temp_policy_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("warden-{name}-{}.csv", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let adapter = FilePolicyAdapter::new(temp_policy_path("missing"));
        assert_eq!(adapter.load().await.unwrap(), PolicySnapshot::default());
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let path = temp_policy_path("reopen");
        let enforcer = Enforcer::from_adapter(Arc::new(FilePolicyAdapter::new(&path)))
            .await
            .unwrap();
        enforcer
            .add_policy(PolicyRule::new("editors", "blog", Some("*"), "edit"))
            .await
            .unwrap();
        enforcer
            .add_grouping_policy(GroupingRule::new("alice", "editors"))
            .await
            .unwrap();

        let reopened = Enforcer::from_adapter(Arc::new(FilePolicyAdapter::new(&path)))
            .await
            .unwrap();
        assert!(reopened.enforce("alice", "blog", Some("post1"), "edit").await.unwrap());

        reopened
            .remove_grouping_policy(&GroupingRule::new("alice", "editors"))
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "p,editors,blog,*,edit\n");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_comma_in_field_survives_reopen() {
        let path = temp_policy_path("comma");
        let enforcer = Enforcer::from_adapter(Arc::new(FilePolicyAdapter::new(&path)))
            .await
            .unwrap();
        assert!(enforcer
            .add_policy(PolicyRule::new("alice", "blog", Some("post,1"), "edit"))
            .await
            .unwrap());

        let reopened = Enforcer::from_adapter(Arc::new(FilePolicyAdapter::new(&path)))
            .await
            .unwrap();
        assert!(reopened.enforce("alice", "blog", Some("post,1"), "edit").await.unwrap());
        assert!(!reopened.enforce("alice", "blog", Some("post"), "edit").await.unwrap());

        assert!(reopened
            .add_policy(PolicyRule::new("bob", "blog", None, "read"))
            .await
            .unwrap());
        let snapshot = FilePolicyAdapter::new(&path).load().await.unwrap();
        assert_eq!(snapshot.policies.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_policy_path("corrupt");
        tokio::fs::write(&path, "z, nonsense\n").await.unwrap();
        let err = FilePolicyAdapter::new(&path).load().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
