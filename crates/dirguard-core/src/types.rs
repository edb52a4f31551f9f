//! GitHub-facing type definitions

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Default REST API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Label applied when a PR stays inside its directory
pub const LABEL_APPROVED: &str = "Dir approved";

/// Label applied when a PR violates the directory policy
pub const LABEL_WRONG_DIR: &str = "Wrong dir";

/// `owner/name` repository reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    /// Owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "Invalid repository format '{}', expected owner/name",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub user reference
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubUser {
    /// Login name
    pub login: String,
}

/// Pull request summary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Author
    pub user: GitHubUser,
    /// `open` or `closed`
    #[serde(default)]
    pub state: Option<String>,
}

/// One file of a PR diff
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullFile {
    /// Repository-relative path
    pub filename: String,
    /// added, removed, modified, renamed, copied, changed
    #[serde(default)]
    pub status: Option<String>,
}

/// Issue/PR conversation comment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    /// Comment id
    pub id: u64,
    /// Markdown body (GitHub may return null)
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedIssue {
    pub number: u64,
}
