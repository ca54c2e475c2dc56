//! Policy CSV source format.
//!
//! One rule per record, comma separated, fields trimmed, standard CSV
//! quoting for fields that contain commas or quotes:
//!
//! ```text
//! # comment
//! p, alice, blog, post1, edit
//! p, editors, blog, *, edit
//! p, alice, blog, -, create
//! p, alice, blog, "post,2", edit
//! g, alice, editors
//! ```
//!
//! Blank lines, records whose first field is empty, and `#` comments are
//! skipped. An unknown tag or a wrong field count fails the whole load.

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::info;

use warden_core::context::{ANONYMOUS, UNAUTHENTICATED};
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_database::traits::PolicySnapshot;
use warden_entity::policy::{GroupingRule, PolicyRule};

use super::enforcer::Enforcer;

/// Counts of rules actually added by [`load_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// New policy rules.
    pub policies_added: usize,
    /// New grouping edges.
    pub groupings_added: usize,
    /// Rules that were already present.
    pub unchanged: usize,
}

/// Parses policy CSV text into rules, in file order.
pub fn parse_policy_csv(content: &str) -> AppResult<PolicySnapshot> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());
    let mut snapshot = PolicySnapshot::default();

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            AppError::with_source(
                ErrorKind::Validation,
                format!("Malformed policy record on line {line}: {e}"),
                e,
            )
        })?;
        let line_no = record.position().map_or(0, |p| p.line());

        let tag = record.get(0).unwrap_or_default();
        if tag.is_empty() || tag.starts_with('#') {
            continue;
        }

        match tag {
            "p" => {
                let [subject, domain, object, action] = rule_fields::<4>(&record, line_no, tag)?;
                snapshot
                    .policies
                    .push(PolicyRule::new(subject, domain, Some(object), action));
            }
            "g" => {
                let [member, group] = rule_fields::<2>(&record, line_no, tag)?;
                snapshot.groupings.push(GroupingRule::new(member, group));
            }
            other => {
                return Err(AppError::validation(format!(
                    "Unknown policy type '{other}' on line {line_no}"
                )));
            }
        }
    }

    Ok(snapshot)
}

fn rule_fields<'a, const N: usize>(
    record: &'a StringRecord,
    line_no: u64,
    tag: &str,
) -> AppResult<[&'a str; N]> {
    let fields: Vec<&str> = record.iter().skip(1).collect();
    let values: [&str; N] = fields.as_slice().try_into().map_err(|_| {
        AppError::validation(format!(
            "Rule '{tag}' on line {line_no} needs {N} fields, found {}",
            fields.len()
        ))
    })?;
    if values.iter().any(|v| v.is_empty()) {
        return Err(AppError::validation(format!(
            "Rule '{tag}' on line {line_no} has an empty field"
        )));
    }
    Ok(values)
}

/// Renders rules in the format read by [`parse_policy_csv`].
pub fn render_policy_csv(snapshot: &PolicySnapshot) -> AppResult<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    for rule in &snapshot.policies {
        let [subject, domain, object, action] = rule.fields();
        writer
            .write_record(["p", subject, domain, object, action])
            .map_err(render_error)?;
    }
    for rule in &snapshot.groupings {
        writer
            .write_record(["g", rule.member.as_str(), rule.group.as_str()])
            .map_err(render_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::from(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Rendered policy is not UTF-8", e))
}

fn render_error(err: csv::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Internal,
        format!("Failed to render policy rules: {err}"),
        err,
    )
}

/// Parses `content` and adds every rule not already present.
///
/// Parsing completes before anything is written, so a malformed file
/// changes nothing.
pub async fn load_into(enforcer: &Enforcer, content: &str) -> AppResult<LoadReport> {
    let snapshot = parse_policy_csv(content)?;
    let mut report = LoadReport::default();

    for rule in snapshot.policies {
        if enforcer.add_policy(rule).await? {
            report.policies_added += 1;
        } else {
            report.unchanged += 1;
        }
    }
    for rule in snapshot.groupings {
        if enforcer.add_grouping_policy(rule).await? {
            report.groupings_added += 1;
        } else {
            report.unchanged += 1;
        }
    }

    info!(
        policies_added = report.policies_added,
        groupings_added = report.groupings_added,
        unchanged = report.unchanged,
        "Policy source loaded"
    );
    Ok(report)
}

/// Places the anonymous subject in the unauthenticated group.
///
/// Returns whether the edge was added.
pub async fn ensure_builtin_groups(enforcer: &Enforcer) -> AppResult<bool> {
    enforcer
        .add_grouping_policy(GroupingRule::new(ANONYMOUS, UNAUTHENTICATED))
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use warden_database::memory::MemoryPolicyAdapter;
    use warden_entity::policy::OBJECT_NONE;

    const SAMPLE: &str = "\
# blog rules
p, alice, blog, post1, edit

p,editors , blog,*,edit
p, alice, blog, -, create
,ignored, line
g, alice, editors
";

    #[test]
    fn test_parse_sample() {
        let snapshot = parse_policy_csv(SAMPLE).unwrap();
        assert_eq!(snapshot.policies.len(), 3);
        assert_eq!(snapshot.policies[1], PolicyRule::new("editors", "blog", Some("*"), "edit"));
        assert_eq!(snapshot.policies[2].object, OBJECT_NONE);
        assert_eq!(snapshot.groupings, vec![GroupingRule::new("alice", "editors")]);
    }

    #[test]
    fn test_unknown_tag_fails_with_line() {
        let err = parse_policy_csv("p, a, d, -, x\nx, a, b\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("line 2"), "{}", err.message);
    }

    #[test]
    fn test_wrong_arity_fails() {
        assert!(parse_policy_csv("p, a, d, x").is_err());
        assert!(parse_policy_csv("g, a").is_err());
        assert!(parse_policy_csv("g, a, b, c").is_err());
        assert!(parse_policy_csv("p, a, , -, x").is_err());
    }

    #[test]
    fn test_render_parses_back() {
        let snapshot = parse_policy_csv(SAMPLE).unwrap();
        let rendered = render_policy_csv(&snapshot).unwrap();
        assert!(rendered.starts_with("p,alice,blog,post1,edit\n"));
        assert_eq!(parse_policy_csv(&rendered).unwrap(), snapshot);
    }

    #[test]
    fn test_quoted_fields() {
        let snapshot = parse_policy_csv("p, alice, blog, \"post,1\", edit\n  # indented\n").unwrap();
        assert_eq!(
            snapshot.policies,
            vec![PolicyRule::new("alice", "blog", Some("post,1"), "edit")]
        );

        let rendered = render_policy_csv(&snapshot).unwrap();
        assert_eq!(rendered, "p,alice,blog,\"post,1\",edit\n");
        assert_eq!(parse_policy_csv(&rendered).unwrap(), snapshot);
    }

    #[test]
    fn test_unterminated_quote_fails() {
        let err = parse_policy_csv("g, a, b\np, a, d, \"x, y\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("line 2"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let enforcer = Enforcer::from_adapter(Arc::new(MemoryPolicyAdapter::new()))
            .await
            .unwrap();

        let first = load_into(&enforcer, SAMPLE).await.unwrap();
        assert_eq!(first.policies_added, 3);
        assert_eq!(first.groupings_added, 1);

        let second = load_into(&enforcer, SAMPLE).await.unwrap();
        assert_eq!(second.policies_added, 0);
        assert_eq!(second.unchanged, 4);
        assert_eq!(enforcer.policies().await.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_source_changes_nothing() {
        let enforcer = Enforcer::from_adapter(Arc::new(MemoryPolicyAdapter::new()))
            .await
            .unwrap();
        assert!(load_into(&enforcer, "p, a, d, -, x\nq, nope\n").await.is_err());
        assert!(enforcer.policies().await.is_empty());
    }

    #[tokio::test]
    async fn test_builtin_groups() {
        let enforcer = Enforcer::from_adapter(Arc::new(MemoryPolicyAdapter::new()))
            .await
            .unwrap();
        assert!(ensure_builtin_groups(&enforcer).await.unwrap());
        assert!(!ensure_builtin_groups(&enforcer).await.unwrap());
        assert_eq!(enforcer.groups_for(ANONYMOUS).await, vec![UNAUTHENTICATED]);
    }
}
