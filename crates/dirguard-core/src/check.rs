//! Directory check of one pull request

use crate::error::Result;
use crate::http::GitHubApiClient;
use crate::policy::{classify, CheckResult, Verdict};
use crate::roster::Roster;
use crate::types::RepoSlug;

/// Verdict together with the serialized record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Classifier verdict
    pub verdict: Verdict,
    /// Record written for the notification steps
    pub result: CheckResult,
    /// Number of changed files inspected
    pub files_checked: usize,
}

/// Classify an already known author and file list
pub fn check_files<S: AsRef<str>>(author: &str, files: &[S], roster: &Roster) -> CheckReport {
    let verdict = classify(author, files, roster);
    let result = CheckResult::from_verdict(author, roster.allowed_dir(author), &verdict);
    tracing::info!(
        author,
        files = files.len(),
        verdict = verdict.kind().as_str(),
        "directory check finished"
    );
    CheckReport {
        verdict,
        result,
        files_checked: files.len(),
    }
}

/// Fetch the PR author and changed files, then classify
pub async fn check_pull_request(
    client: &GitHubApiClient,
    repo: &RepoSlug,
    pr: u64,
    roster: &Roster,
) -> Result<CheckReport> {
    let pull = client.get_pull_request(repo, pr).await?;
    let files = client.list_pull_filenames(repo, pr).await?;
    tracing::debug!(author = %pull.user.login, count = files.len(), "fetched PR");
    Ok(check_files(&pull.user.login, &files, roster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::StudentRecord;

    #[test]
    fn test_check_files_records_allowed_dir() {
        let roster: Roster = std::iter::once(StudentRecord::new("bob", "./students/Bob")).collect();
        let report = check_files("bob", &["students/Bob/notes.txt"], &roster);
        assert_eq!(report.result.exit_code, 5);
        assert_eq!(report.result.allowed.as_deref(), Some("students/Bob"));
        assert_eq!(report.result.non_task_files, vec!["students/Bob/notes.txt"]);
        assert_eq!(report.files_checked, 1);

        let report = check_files("eve", &["students/Bob/task_01/a"], &roster);
        assert_eq!(report.verdict, Verdict::UnmappedAuthor);
        assert_eq!(report.result.allowed, None);
    }
}
