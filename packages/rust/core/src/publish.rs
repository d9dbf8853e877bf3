//! Hand-off to the publishing collaborator: source links, change request
//! text, and a filesystem publisher.
//!
//! Branch creation and pull requests on a hosting platform are not done
//! here; [`ChangeRequest`] carries the text such a collaborator needs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use threadkb_shared::{MergeResult, Result, ThreadKbError};

use crate::catalog::resolve_inside;

// ---------------------------------------------------------------------------
// Source links
// ---------------------------------------------------------------------------

/// Location of the originating conversation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Workspace (team) id, if known.
    pub workspace_id: Option<String>,
    /// Channel id, e.g. `C0123ABCD`.
    pub channel_id: String,
    /// Message timestamp, e.g. `1712345678.123456`.
    pub message_ts: String,
}

impl SourceRef {
    /// Build the deep link to the message.
    ///
    /// With a workspace id this is the `app_redirect` form, which works for
    /// any member; without one it falls back to the web client thread URL.
    pub fn link(&self) -> Result<Url> {
        let channel = self.channel_id.trim();
        let ts = self.message_ts.trim();
        if channel.is_empty() || ts.is_empty() {
            return Err(ThreadKbError::validation(
                "channel id and message timestamp are required to build a source link",
            ));
        }

        match self.workspace_id.as_deref().map(str::trim) {
            Some(team) if !team.is_empty() => Url::parse_with_params(
                "https://slack.com/app_redirect",
                &[("team", team), ("channel", channel), ("message_ts", ts)],
            )
            .map_err(|e| ThreadKbError::validation(format!("invalid source link: {e}"))),
            _ => {
                let message_id = ts.replace('.', "");
                let raw = format!("https://app.slack.com/client/{channel}/thread/{channel}/{message_id}");
                Url::parse(&raw)
                    .map_err(|e| ThreadKbError::validation(format!("invalid source link '{raw}': {e}")))
            }
        }
    }
}

/// Check that a user-supplied source link is an absolute http(s) URL.
pub fn validate_source_link(link: &str) -> Result<Url> {
    let url = Url::parse(link.trim())
        .map_err(|e| ThreadKbError::validation(format!("source link '{link}' is not a URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ThreadKbError::validation(format!(
            "source link must be http(s), got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Change request
// ---------------------------------------------------------------------------

/// Context the publishing collaborator supplies for change request text.
#[derive(Debug, Clone, Default)]
pub struct ChangeContext {
    /// Branch name prefix, e.g. `kb/add-`.
    pub branch_prefix: String,
    /// Message timestamp, appended to the branch name to keep it unique.
    pub message_ts: Option<String>,
    /// Human-readable channel name, without `#`.
    pub channel_name: Option<String>,
}

/// Branch, commit and pull-request text for one merge result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub branch: String,
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl ChangeRequest {
    pub fn for_result(result: &MergeResult, ctx: &ChangeContext) -> Self {
        let mut branch = format!("{}{}", ctx.branch_prefix, result.slug);
        if let Some(ts) = ctx.message_ts.as_deref().filter(|ts| !ts.is_empty()) {
            branch.push('-');
            branch.push_str(&ts.replace('.', "-"));
        }

        let (heading, action, verb) = if result.is_update {
            (
                "Updated",
                "Extended existing article with new information",
                "updates an existing",
            )
        } else {
            ("New", "Created new article", "adds a new")
        };

        let mut pr_body = format!("## {heading} Knowledge Base Article\n\n");
        if let Some(source) = result.sources.last() {
            pr_body.push_str(&format!("**Source:** {source}\n"));
        }
        if let Some(channel) = ctx.channel_name.as_deref() {
            pr_body.push_str(&format!("**Channel:** #{}\n", channel.trim_start_matches('#')));
        }
        pr_body.push_str(&format!("**Action:** {action}\n\n"));
        pr_body.push_str(&format!(
            "This PR {verb} knowledge base article generated from a saved conversation.\n\n"
        ));
        pr_body.push_str(&format!("### File\n- `{}`\n", result.file_path));

        Self {
            branch,
            commit_message: result.change_summary_title.clone(),
            pr_title: result.change_summary_title.clone(),
            pr_body,
        }
    }
}

// ---------------------------------------------------------------------------
// Publishers
// ---------------------------------------------------------------------------

/// Outcome of writing a merge result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Where the document was written.
    pub path: PathBuf,
    /// `true` if the file did not exist before.
    pub created: bool,
}

/// Writes merge results somewhere. Failures here are the only errors the
/// reconciliation flow propagates.
pub trait Publisher {
    fn publish(&self, result: &MergeResult) -> Result<PublishReceipt>;
}

/// Writes merge results into a working tree on disk.
#[derive(Debug, Clone)]
pub struct FsPublisher {
    root: PathBuf,
}

impl FsPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Publisher for FsPublisher {
    #[instrument(skip_all, fields(path = %result.file_path, update = result.is_update))]
    fn publish(&self, result: &MergeResult) -> Result<PublishReceipt> {
        let target = resolve_inside(&self.root, &result.file_path)
            .map_err(|e| ThreadKbError::publish(e.to_string()))?;

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ThreadKbError::io(parent, e))?;
        }

        let created = !target.exists();
        std::fs::write(&target, &result.final_content)
            .map_err(|e| ThreadKbError::io(&target, e))?;

        info!(path = %target.display(), created, "article written");
        Ok(PublishReceipt {
            path: target,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadkb_shared::SourceLink;

    fn result(is_update: bool) -> MergeResult {
        MergeResult {
            final_content: "# Redis HA\n\nBody\n".into(),
            is_update,
            file_path: "kb/redis-ha.md".into(),
            change_summary_title: if is_update {
                "Update KB article: Redis HA".into()
            } else {
                "Add KB article: Redis HA".into()
            },
            title: "Redis HA".into(),
            slug: "redis-ha".into(),
            keywords: vec!["redis".into()],
            sources: vec![SourceLink::new("Slack Thread", "https://example.com/t/2")],
        }
    }

    #[test]
    fn source_link_with_workspace() {
        let link = SourceRef {
            workspace_id: Some("T024BE7LD".into()),
            channel_id: "C0123".into(),
            message_ts: "1712345678.123456".into(),
        }
        .link()
        .expect("link");
        assert_eq!(
            link.as_str(),
            "https://slack.com/app_redirect?team=T024BE7LD&channel=C0123&message_ts=1712345678.123456"
        );
    }

    #[test]
    fn source_link_without_workspace() {
        let link = SourceRef {
            workspace_id: None,
            channel_id: "C0123".into(),
            message_ts: "1712345678.123456".into(),
        }
        .link()
        .expect("link");
        assert_eq!(
            link.as_str(),
            "https://app.slack.com/client/C0123/thread/C0123/1712345678123456"
        );
    }

    #[test]
    fn source_link_requires_channel_and_ts() {
        let err = SourceRef {
            workspace_id: None,
            channel_id: " ".into(),
            message_ts: "1.2".into(),
        }
        .link()
        .unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn source_link_validation() {
        assert!(validate_source_link("https://example.com/t/1").is_ok());
        assert!(validate_source_link("not a url").is_err());
        assert!(validate_source_link("ftp://example.com/x").is_err());
    }

    #[test]
    fn change_request_for_new_article() {
        let ctx = ChangeContext {
            branch_prefix: "kb/add-".into(),
            message_ts: Some("1712345678.123456".into()),
            channel_name: Some("#infra".into()),
        };
        let cr = ChangeRequest::for_result(&result(false), &ctx);
        assert_eq!(cr.branch, "kb/add-redis-ha-1712345678-123456");
        assert_eq!(cr.pr_title, "Add KB article: Redis HA");
        assert_eq!(cr.commit_message, cr.pr_title);
        assert!(cr.pr_body.starts_with("## New Knowledge Base Article"));
        assert!(cr.pr_body.contains("**Channel:** #infra\n"));
        assert!(cr.pr_body.contains("**Action:** Created new article"));
        assert!(cr.pr_body.contains("- `kb/redis-ha.md`"));
    }

    #[test]
    fn change_request_for_update() {
        let ctx = ChangeContext {
            branch_prefix: "kb/add-".into(),
            ..ChangeContext::default()
        };
        let cr = ChangeRequest::for_result(&result(true), &ctx);
        assert_eq!(cr.branch, "kb/add-redis-ha");
        assert!(cr.pr_body.starts_with("## Updated Knowledge Base Article"));
        assert!(cr.pr_body.contains("[Slack Thread](https://example.com/t/2)"));
        assert!(!cr.pr_body.contains("**Channel:**"));
    }

    #[test]
    fn fs_publisher_creates_then_updates() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let publisher = FsPublisher::new(tmp.path());

        let receipt = publisher.publish(&result(false)).expect("publish");
        assert!(receipt.created);
        assert_eq!(
            std::fs::read_to_string(&receipt.path).expect("read"),
            "# Redis HA\n\nBody\n"
        );

        let receipt = publisher.publish(&result(true)).expect("publish");
        assert!(!receipt.created);
    }

    #[test]
    fn fs_publisher_rejects_escaping_path() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut bad = result(false);
        bad.file_path = "../outside.md".into();
        let err = FsPublisher::new(tmp.path()).publish(&bad).unwrap_err();
        assert!(matches!(err, ThreadKbError::Publish(_)));
    }
}
