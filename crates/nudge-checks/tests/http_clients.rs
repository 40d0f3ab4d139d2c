//! Registry and issue tracker clients against a loopback stub.

mod common;

use common::{StubResponse, StubServer};
use nudge_checks::{
    GitHubClient, IssueKind, IssueTracker, NudgeConfig, PackageIndex, RegistryClient, TokenSet,
};

fn config_for(server: &StubServer) -> NudgeConfig {
    NudgeConfig::default()
        .with_github_api_url(&server.base_url)
        .with_package_registry_url(&server.base_url)
}

#[tokio::test]
async fn test_registry_lists_published_versions() {
    let server = StubServer::start(|_| {
        StubResponse::json(200, r#"[{"number":"5.1.1","platform":"ruby"},{"number":"5.0.0"}]"#)
    })
    .await;
    let client = RegistryClient::new(&config_for(&server)).unwrap();

    let versions = client.versions("rails").await.unwrap();

    assert_eq!(versions, Some(vec!["5.1.1".to_string(), "5.0.0".to_string()]));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_line, "GET /api/v1/versions/rails.json HTTP/1.1");
    assert!(requests[0].header("user-agent").unwrap().starts_with("nudge/"));
}

#[tokio::test]
async fn test_registry_client_error_means_unknown_package() {
    let server = StubServer::start(|_| StubResponse::json(404, "This rubygem could not be found.")).await;
    let client = RegistryClient::new(&config_for(&server)).unwrap();

    assert_eq!(client.versions("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_registry_server_error_is_an_error() {
    let server = StubServer::start(|_| StubResponse::json(503, "")).await;
    let client = RegistryClient::new(&config_for(&server)).unwrap();

    let err = client.versions("rails").await.unwrap_err();
    assert!(err.to_string().contains("503"), "{err}");
}

#[tokio::test]
async fn test_issue_fetch_sends_accept_and_scoped_token() {
    let server = StubServer::start(|_| {
        StubResponse::json(
            200,
            r#"{"state":"closed","title":"Fix it","assignee":{"login":"octocat"},"number":12}"#,
        )
    })
    .await;
    let tokens = TokenSet::from_vars([
        ("NUDGE_GITHUB_TOKEN", "global"),
        ("NUDGE_GITHUB_TOKEN__ACME__WIDGETS_API", "scoped"),
    ]);
    let client = GitHubClient::new(&config_for(&server), tokens).unwrap();

    let issue = client
        .fetch(IssueKind::PullRequest, "acme", "widgets-api", "12")
        .await
        .unwrap()
        .unwrap();

    assert!(issue.is_closed());
    assert_eq!(issue.assignee_label(), "@octocat");

    let request = &server.requests()[0];
    assert_eq!(request.request_line, "GET /repos/acme/widgets-api/pulls/12 HTTP/1.1");
    assert_eq!(request.header("accept"), Some("application/vnd.github.v3+json"));
    assert_eq!(request.header("authorization"), Some("token scoped"));
}

#[tokio::test]
async fn test_issue_fetch_without_token_sends_no_authorization() {
    let server = StubServer::start(|_| StubResponse::json(200, r#"{"state":"open","title":"t","assignee":null}"#)).await;
    let client = GitHubClient::new(&config_for(&server), TokenSet::new()).unwrap();

    let issue = client
        .fetch(IssueKind::Issue, "rails", "rails", "1")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(issue.assignee_label(), "unassigned");
    assert!(server.requests()[0].header("authorization").is_none());
}

#[tokio::test]
async fn test_issue_client_error_is_none() {
    let server = StubServer::start(|_| StubResponse::json(404, r#"{"message":"Not Found"}"#)).await;
    let client = GitHubClient::new(&config_for(&server), TokenSet::new()).unwrap();

    let issue = client.fetch(IssueKind::Issue, "org", "private", "3").await.unwrap();
    assert!(issue.is_none());
}
