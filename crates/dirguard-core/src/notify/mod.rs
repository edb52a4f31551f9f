//! PR notifications driven by a stored [`CheckResult`]
//!
//! Two flows: [`report_result`] labels, comments on and closes rejected PRs
//! (and relabels approved ones), [`on_success`] opens a tracking issue for an
//! approved submission. Label and comment reads degrade to empty lists with a
//! warning; every mutation propagates its error.

pub mod templates;

use crate::error::Result;
use crate::http::GitHubApiClient;
use crate::policy::detect::{detect_student_and_task, short_task_label};
use crate::policy::{CheckResult, VerdictKind};
use crate::types::{RepoSlug, LABEL_APPROVED, LABEL_WRONG_DIR};

pub use templates::COMMENT_MARKER;

/// What happened to the bot comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    /// A new comment was posted
    Posted(u64),
    /// The existing marked comment was edited
    Updated(u64),
}

/// Result of [`report_result`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No result file was available
    NoResult,
    /// Exit code outside the known verdicts; nothing was touched
    Ignored {
        /// The stored exit code
        exit_code: i32,
    },
    /// Labels updated for an approved PR
    Approved,
    /// Comment written, labels switched and the PR closed
    Rejected {
        /// Verdict that caused the rejection
        kind: VerdictKind,
        /// Comment posted or updated
        comment: CommentAction,
    },
}

/// Result of [`on_success`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessOutcome {
    /// The stored result is not an approval
    NotApproved {
        /// The stored exit code
        exit_code: i32,
    },
    /// Student or task could not be determined; only the label was ensured
    Undetected,
    /// Tracking issue opened
    IssueCreated {
        /// Issue number
        number: u64,
        /// Issue title
        title: String,
    },
}

async fn labels_or_empty(client: &GitHubApiClient, repo: &RepoSlug, pr: u64) -> Vec<String> {
    match client.list_issue_labels(repo, pr).await {
        Ok(labels) => labels,
        Err(e) => {
            tracing::warn!("failed to fetch labels: {}", e);
            Vec::new()
        }
    }
}

/// Remove `remove` if present and add `add` if absent
async fn switch_labels(
    client: &GitHubApiClient,
    repo: &RepoSlug,
    pr: u64,
    remove: &str,
    add: &str,
) -> Result<()> {
    let existing = labels_or_empty(client, repo, pr).await;
    if existing.iter().any(|l| l == remove) {
        client.remove_label(repo, pr, remove).await?;
    }
    if !existing.iter().any(|l| l == add) {
        client.add_label(repo, pr, add).await?;
    }
    Ok(())
}

async fn ensure_label(client: &GitHubApiClient, repo: &RepoSlug, pr: u64, label: &str) -> Result<()> {
    let existing = labels_or_empty(client, repo, pr).await;
    if !existing.iter().any(|l| l == label) {
        client.add_label(repo, pr, label).await?;
    }
    Ok(())
}

/// Post the marked comment, or edit the one already carrying the marker
async fn upsert_comment(
    client: &GitHubApiClient,
    repo: &RepoSlug,
    pr: u64,
    body: &str,
) -> Result<CommentAction> {
    let marked = templates::with_marker(body);
    let comments = match client.list_issue_comments(repo, pr).await {
        Ok(comments) => comments,
        Err(e) => {
            tracing::warn!("failed to fetch comments: {}", e);
            Vec::new()
        }
    };

    let existing = comments
        .iter()
        .find(|c| c.body.as_deref().unwrap_or_default().contains(COMMENT_MARKER));

    match existing {
        Some(comment) => {
            tracing::info!(comment_id = comment.id, "found existing bot comment, updating");
            client.update_comment(repo, comment.id, &marked).await?;
            Ok(CommentAction::Updated(comment.id))
        }
        None => {
            let posted = client.post_comment(repo, pr, &marked).await?;
            Ok(CommentAction::Posted(posted.id))
        }
    }
}

/// Act on a stored check result for PR `pr`
pub async fn report_result(
    client: &GitHubApiClient,
    repo: &RepoSlug,
    pr: u64,
    result: Option<&CheckResult>,
) -> Result<NotifyOutcome> {
    let Some(result) = result else {
        tracing::info!("no check result, nothing to report");
        return Ok(NotifyOutcome::NoResult);
    };

    match result.kind() {
        Some(VerdictKind::Approved) => {
            switch_labels(client, repo, pr, LABEL_WRONG_DIR, LABEL_APPROVED).await?;
            tracing::info!(pr, "approved: ensured '{}' label", LABEL_APPROVED);
            Ok(NotifyOutcome::Approved)
        }
        Some(kind) => {
            let Some(body) = templates::rejection_body(result) else {
                return Ok(NotifyOutcome::Ignored {
                    exit_code: result.exit_code,
                });
            };
            let comment = upsert_comment(client, repo, pr, &body).await?;
            switch_labels(client, repo, pr, LABEL_APPROVED, LABEL_WRONG_DIR).await?;
            client.close_pull_request(repo, pr).await?;
            tracing::info!(pr, verdict = kind.as_str(), "rejected and closed");
            Ok(NotifyOutcome::Rejected { kind, comment })
        }
        None => {
            tracing::info!(
                exit_code = result.exit_code,
                "no failure detected, nothing to do"
            );
            Ok(NotifyOutcome::Ignored {
                exit_code: result.exit_code,
            })
        }
    }
}

/// Label an approved PR and open its tracking issue.
///
/// A missing result proceeds as if approved; the allowed directory, when
/// known, is the fallback for the student name.
pub async fn on_success(
    client: &GitHubApiClient,
    repo: &RepoSlug,
    pr: u64,
    result: Option<&CheckResult>,
) -> Result<SuccessOutcome> {
    if let Some(result) = result {
        if result.exit_code != 0 {
            tracing::info!(exit_code = result.exit_code, "validation not successful, skipping");
            return Ok(SuccessOutcome::NotApproved {
                exit_code: result.exit_code,
            });
        }
    }
    let allowed = result.and_then(|r| r.allowed.as_deref());

    let files = match client.list_pull_filenames(repo, pr).await {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("failed to fetch PR files: {}", e);
            Vec::new()
        }
    };

    let (student, task) = detect_student_and_task(&files, allowed);
    let (Some(student), Some(task)) = (student, task) else {
        tracing::warn!("could not detect student or task from PR files");
        ensure_label(client, repo, pr, LABEL_APPROVED).await?;
        return Ok(SuccessOutcome::Undetected);
    };

    ensure_label(client, repo, pr, LABEL_APPROVED).await?;

    let task_label = short_task_label(&task);
    let title = templates::tracking_issue_title(&student, &task_label);
    let body = templates::tracking_issue_body(&student, &task_label);
    let number = client.create_issue(repo, &title, &body).await?;

    client
        .post_comment(repo, pr, &templates::tracking_issue_comment(number, &title))
        .await?;

    Ok(SuccessOutcome::IssueCreated { number, title })
}
