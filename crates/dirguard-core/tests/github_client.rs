//! GitHub client behavior against a mock server

use dirguard_core::roster::Roster;
use dirguard_core::{check_pull_request, ErrorKind, GitHubApiClient, RepoSlug, Verdict};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo() -> RepoSlug {
    "owner/repo".parse().unwrap()
}

#[tokio::test]
async fn test_requests_carry_token_and_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/5"))
        .and(header("authorization", "Bearer t0k"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 5,
            "title": "task 1",
            "user": { "login": "alice" },
            "state": "open"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubApiClient::new(server.uri(), Some("t0k".to_string()));
    let pull = client.get_pull_request(&repo(), 5).await.unwrap();
    assert_eq!(pull.user.login, "alice");
    assert_eq!(pull.state.as_deref(), Some("open"));
}

#[tokio::test]
async fn test_pull_files_follow_link_header() {
    let server = MockServer::start().await;
    let page2 = format!("{}/repos/owner/repo/pulls/9/files?per_page=100&page=2", server.uri());
    let page3 = format!("{}/repos/owner/repo/pulls/9/files?per_page=100&page=3", server.uri());

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/9/files"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "filename": "c" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/9/files"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", format!("<{}>; rel=\"next\"", page3).as_str())
                .set_body_json(json!([{ "filename": "b" }, { "filename": "" }])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/9/files"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Link",
                    format!("<{}>; rel=\"next\", <{}>; rel=\"last\"", page2, page3).as_str(),
                )
                .set_body_json(json!([{ "filename": "a", "status": "added" }])),
        )
        .mount(&server)
        .await;

    let client = GitHubApiClient::new(server.uri(), None);
    let files = client.list_pull_filenames(&repo(), 9).await.unwrap();
    assert_eq!(files, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = GitHubApiClient::new(server.uri(), None);
    let err = client.get_pull_request(&repo(), 404).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status(), Some(404));
    assert!(err.message().contains("Not Found"));
}

#[tokio::test]
async fn test_exhausted_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/issues/3/labels"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let client = GitHubApiClient::new(server.uri(), None);
    let err = client.list_issue_labels(&repo(), 3).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(err.message().contains("rate limit"));
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let client = GitHubApiClient::new(uri, None);
    let err = client.list_issue_labels(&repo(), 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
}

#[tokio::test]
async fn test_check_pull_request_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 11,
            "user": { "login": "ivanov-gh" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls/11/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "students/Ivanov/task_02/main.py" },
            { "filename": "students/Petrov/task_02/main.py" }
        ])))
        .mount(&server)
        .await;

    let (roster, warnings) =
        Roster::from_csv_str("Github Username,Directory\nivanov-gh,students/Ivanov\n").unwrap();
    assert!(warnings.is_empty());

    let client = GitHubApiClient::new(server.uri(), None);
    let report = check_pull_request(&client, &repo(), 11, &roster).await.unwrap();
    assert_eq!(
        report.verdict,
        Verdict::OutsideAllowedDirectory(vec!["students/Petrov/task_02/main.py".to_string()])
    );
    assert_eq!(report.result.exit_code, 2);
    assert_eq!(report.result.author, "ivanov-gh");
    assert_eq!(report.files_checked, 2);
}
