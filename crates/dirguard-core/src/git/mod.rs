//! Local checkout of a pull request head

use crate::error::{Error, Result};
use std::path::Path;
use tokio::process::Command;

/// Local branch name used for PR `pr`
pub fn pr_branch(pr: u64) -> String {
    format!("pr-{}", pr)
}

async fn run_git(repo_root: &Path, args: &[&str]) -> Result<()> {
    tracing::debug!(?args, "running git");
    let output = Command::new("git")
        .current_dir(repo_root)
        .args(args)
        .output()
        .await
        .map_err(|e| Error::Git(format!("failed to spawn git: {}", e)))?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(Error::Git(format!(
        "git {} failed ({}): {}",
        args.join(" "),
        output.status,
        stderr
    )))
}

/// Point local branch `pr-<n>` at the PR head and check it out.
///
/// Fetches into `FETCH_HEAD` first so the current branch can be moved too.
pub async fn checkout_pr_branch(repo_root: &Path, pr: u64) -> Result<String> {
    let branch = pr_branch(pr);
    let fetch_ref = format!("pull/{}/head", pr);

    run_git(repo_root, &["fetch", "origin", &fetch_ref]).await?;
    run_git(repo_root, &["checkout", "-B", &branch, "FETCH_HEAD"])
        .await
        .map_err(|e| {
            Error::Git(format!(
                "{} (do you have uncommitted changes preventing checkout?)",
                e.message()
            ))
        })?;

    tracing::info!(branch = %branch, "checked out PR head");
    Ok(branch)
}
