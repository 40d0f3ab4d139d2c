//! Issue tracker client.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{NudgeConfig, TokenSet};
use crate::error::Result;
use crate::http::{build_client, get_json, Fetched};

/// Issues and pull requests live under different API paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    Issue,
    PullRequest,
}

impl IssueKind {
    /// API path segment.
    pub fn path(self) -> &'static str {
        match self {
            IssueKind::Issue => "issues",
            IssueKind::PullRequest => "pulls",
        }
    }

    /// Path segment of the browser URL.
    pub fn web_path(self) -> &'static str {
        match self {
            IssueKind::Issue => "issues",
            IssueKind::PullRequest => "pull",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Issue => f.write_str("issue"),
            IssueKind::PullRequest => f.write_str("PR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAssignee {
    pub login: String,
}

/// The fields of an issue or pull request the checks look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub state: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub assignee: Option<IssueAssignee>,
}

impl Issue {
    pub fn new(state: &str, title: &str) -> Self {
        Self {
            state: state.to_string(),
            title: title.to_string(),
            assignee: None,
        }
    }

    pub fn with_assignee(mut self, login: &str) -> Self {
        self.assignee = Some(IssueAssignee {
            login: login.to_string(),
        });
        self
    }

    pub fn is_closed(&self) -> bool {
        self.state == "closed"
    }

    /// `@login`, or `unassigned`.
    pub fn assignee_label(&self) -> String {
        match &self.assignee {
            Some(a) => format!("@{}", a.login),
            None => "unassigned".to_string(),
        }
    }
}

/// Read access to issues and pull requests.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch `org/repo#number`, or `None` on a client error (missing issue,
    /// private repository without a token, ...).
    async fn fetch(
        &self,
        kind: IssueKind,
        org: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Issue>>;
}

/// `GET {base}/repos/{org}/{repo}/{issues|pulls}/{number}`
pub struct GitHubClient {
    base_url: String,
    tokens: TokenSet,
    http_client: Client,
}

impl GitHubClient {
    pub fn new(config: &NudgeConfig, tokens: TokenSet) -> Result<Self> {
        Ok(GitHubClient {
            base_url: config.github_api_url.trim_end_matches('/').to_string(),
            tokens,
            http_client: build_client(config)?,
        })
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn fetch(
        &self,
        kind: IssueKind,
        org: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Issue>> {
        let url = format!(
            "{}/repos/{}/{}/{}/{}",
            self.base_url,
            org,
            repo,
            kind.path(),
            number
        );

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = self.tokens.lookup(org, repo) {
            request = request.header("Authorization", format!("token {token}"));
        } else {
            debug!(org = %org, repo = %repo, "no issue tracker token configured");
        }

        match get_json::<Issue>(request, &url).await? {
            Fetched::Found(issue) => Ok(Some(issue)),
            Fetched::ClientError(_) => Ok(None),
        }
    }
}
