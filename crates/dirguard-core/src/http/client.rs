//! GitHub REST API client for pull requests, labels, comments and issues

use crate::error::{Error, Result};
use crate::types::{
    CreatedIssue, IssueComment, LabelRef, PullFile, PullRequest, RepoSlug,
};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::json;

/// Hard stop for runaway pagination
const MAX_PAGES: usize = 1000;

/// Extract the `rel="next"` target from a `Link` header
pub fn parse_next_link(link: &str) -> Option<String> {
    link.split(',').map(str::trim).find_map(|part| {
        let (target, rel) = part.split_once(';')?;
        if rel.trim() != r#"rel="next""# {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: String, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dirguard/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// `true` when a token will be sent
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/vnd.github+json");

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    fn repo_url(&self, repo: &RepoSlug, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.base_url, repo.owner, repo.name, tail)
    }

    /// Send and map non-success statuses to [`Error::Api`]
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if remaining.as_deref() == Some("0") {
                return Err(Error::Api {
                    status: status.as_u16(),
                    message: format!("{}: GitHub API rate limit exceeded", what),
                });
            }
        }

        let body = response.text().await.unwrap_or_default();
        let detail: String = body.chars().take(300).collect();
        Err(Error::Api {
            status: status.as_u16(),
            message: format!("{}: {}", what, detail),
        })
    }

    /// Fetch a pull request
    pub async fn get_pull_request(&self, repo: &RepoSlug, pr_number: u64) -> Result<PullRequest> {
        let url = self.repo_url(repo, &format!("pulls/{}", pr_number));
        let what = format!("fetch PR #{}", pr_number);
        let response = self.send(self.request(Method::GET, &url), &what).await?;
        Ok(response.json().await?)
    }

    /// Fetch every changed file of a pull request, following `Link` pagination
    pub async fn list_pull_files(&self, repo: &RepoSlug, pr_number: u64) -> Result<Vec<PullFile>> {
        let mut url = Some(self.repo_url(repo, &format!("pulls/{}/files?per_page=100", pr_number)));
        let what = format!("list files of PR #{}", pr_number);
        let mut files = Vec::new();
        let mut pages = 0usize;

        while let Some(current) = url.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(Error::Runtime(
                    "Too many pages in GitHub API response".to_string(),
                ));
            }

            let response = self.send(self.request(Method::GET, &current), &what).await?;
            url = response
                .headers()
                .get("Link")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);

            let batch: Vec<PullFile> = response.json().await?;
            tracing::debug!(page = pages, count = batch.len(), "fetched PR files");
            files.extend(batch);
        }

        Ok(files)
    }

    /// Changed file paths of a pull request, in API order
    pub async fn list_pull_filenames(&self, repo: &RepoSlug, pr_number: u64) -> Result<Vec<String>> {
        Ok(self
            .list_pull_files(repo, pr_number)
            .await?
            .into_iter()
            .map(|f| f.filename)
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Label names currently on an issue or PR
    pub async fn list_issue_labels(&self, repo: &RepoSlug, number: u64) -> Result<Vec<String>> {
        let url = self.repo_url(repo, &format!("issues/{}/labels", number));
        let response = self
            .send(self.request(Method::GET, &url), "list labels")
            .await?;
        let labels: Vec<LabelRef> = response.json().await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    /// Add one label
    pub async fn add_label(&self, repo: &RepoSlug, number: u64, label: &str) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/{}/labels", number));
        let request = self.request(Method::POST, &url).json(&[label]);
        self.send(request, &format!("add label '{}'", label)).await?;
        tracing::info!(label, number, "label added");
        Ok(())
    }

    /// Remove one label; the name is percent-encoded into the path
    pub async fn remove_label(&self, repo: &RepoSlug, number: u64, label: &str) -> Result<()> {
        let base = self.repo_url(repo, &format!("issues/{}/labels", number));
        let mut url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("invalid API URL '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("API URL '{}' cannot be a base", base)))?
            .push(label);

        self.send(
            self.request(Method::DELETE, url.as_str()),
            &format!("remove label '{}'", label),
        )
        .await?;
        tracing::info!(label, number, "label removed");
        Ok(())
    }

    /// Conversation comments of an issue or PR (first 100)
    pub async fn list_issue_comments(&self, repo: &RepoSlug, number: u64) -> Result<Vec<IssueComment>> {
        let url = self.repo_url(repo, &format!("issues/{}/comments?per_page=100", number));
        let response = self
            .send(self.request(Method::GET, &url), "list comments")
            .await?;
        Ok(response.json().await?)
    }

    /// Post a new comment, returning it
    pub async fn post_comment(&self, repo: &RepoSlug, number: u64, body: &str) -> Result<IssueComment> {
        let url = self.repo_url(repo, &format!("issues/{}/comments", number));
        let request = self.request(Method::POST, &url).json(&json!({ "body": body }));
        let response = self.send(request, "post comment").await?;
        let comment: IssueComment = response.json().await?;
        tracing::info!(number, comment_id = comment.id, "comment posted");
        Ok(comment)
    }

    /// Replace the body of an existing comment
    pub async fn update_comment(&self, repo: &RepoSlug, comment_id: u64, body: &str) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/comments/{}", comment_id));
        let request = self.request(Method::PATCH, &url).json(&json!({ "body": body }));
        self.send(request, "update comment").await?;
        tracing::info!(comment_id, "comment updated");
        Ok(())
    }

    /// Close a pull request through the issues endpoint
    pub async fn close_pull_request(&self, repo: &RepoSlug, pr_number: u64) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/{}", pr_number));
        let request = self
            .request(Method::PATCH, &url)
            .json(&json!({ "state": "closed" }));
        self.send(request, &format!("close PR #{}", pr_number)).await?;
        tracing::info!(pr_number, "pull request closed");
        Ok(())
    }

    /// Open an issue, returning its number
    pub async fn create_issue(&self, repo: &RepoSlug, title: &str, body: &str) -> Result<u64> {
        let url = self.repo_url(repo, "issues");
        let request = self
            .request(Method::POST, &url)
            .json(&json!({ "title": title, "body": body }));
        let response = self.send(request, "create issue").await?;
        let issue: CreatedIssue = response.json().await?;
        tracing::info!(issue = issue.number, title, "issue created");
        Ok(issue.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_client_creation() {
        let client = GitHubApiClient::new("https://api.github.com/".to_string(), None);
        assert_eq!(client.base_url, "https://api.github.com");
        assert!(!client.has_token());
    }

    #[test]
    fn test_empty_token_is_dropped() {
        let client = GitHubApiClient::new("https://api.github.com".to_string(), Some(String::new()));
        assert!(client.token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GitHubApiClient::new(
            "https://api.github.com".to_string(),
            Some("ghp_SuperSecret42".to_string()),
        );
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("ghp_SuperSecret42"));
        assert!(debug_output.contains("<redacted>"));
    }

    #[test]
    fn test_repo_url() {
        let client = GitHubApiClient::new("https://api.github.com".to_string(), None);
        let repo: RepoSlug = "org/repo".parse().unwrap();
        assert_eq!(
            client.repo_url(&repo, "pulls/42/files?per_page=100"),
            "https://api.github.com/repos/org/repo/pulls/42/files?per_page=100"
        );
    }

    #[test]
    fn test_parse_next_link() {
        let header = r#"<https://api.github.com/repositories/1/pulls/42/files?page=2>; rel="next", <https://api.github.com/repositories/1/pulls/42/files?page=5>; rel="last""#;
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls/42/files?page=2")
        );
    }

    #[test]
    fn test_parse_next_link_absent() {
        let header = r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#;
        assert_eq!(parse_next_link(header), None);
        assert_eq!(parse_next_link(""), None);
        assert_eq!(parse_next_link("garbage"), None);
    }
}
