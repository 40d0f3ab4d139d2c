//! Endpoint, HTTP and credential settings for the network-backed checks.
//!
//! Everything here is captured once at startup and handed to the clients;
//! checks never read the process environment themselves.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base name of the issue-tracker token variables.
pub const GITHUB_TOKEN_ENV: &str = "NUDGE_GITHUB_TOKEN";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_PACKAGE_REGISTRY_URL: &str = "https://rubygems.org";

/// Endpoints and HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeConfig {
    /// Issue tracker API base URL
    pub github_api_url: String,
    /// Package registry base URL
    pub package_registry_url: String,
    /// Whole-request timeout once connected
    pub read_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        NudgeConfig {
            github_api_url: std::env::var("NUDGE_GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
            package_registry_url: std::env::var("NUDGE_PACKAGE_REGISTRY_URL")
                .unwrap_or_else(|_| DEFAULT_PACKAGE_REGISTRY_URL.to_string()),
            read_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            user_agent: format!("nudge/{}", nudge_core::VERSION),
        }
    }
}

impl NudgeConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point the issue tracker client at `url`
    pub fn with_github_api_url(mut self, url: &str) -> Self {
        self.github_api_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Point the package registry client at `url`
    pub fn with_package_registry_url(mut self, url: &str) -> Self {
        self.package_registry_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, read: Duration, connect: Duration) -> Self {
        self.read_timeout = read;
        self.connect_timeout = connect;
        self
    }
}

/// Issue-tracker tokens keyed by environment variable name.
///
/// Lookup order for `org/repo` is `NUDGE_GITHUB_TOKEN__ORG__REPO`,
/// `NUDGE_GITHUB_TOKEN__ORG`, then `NUDGE_GITHUB_TOKEN`; the first non-empty
/// value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: HashMap<String, String>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every `NUDGE_GITHUB_TOKEN*` variable of the current process.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from `(name, value)` pairs, keeping only token variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tokens = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v)| k.starts_with(GITHUB_TOKEN_ENV) && !v.is_empty())
            .collect();
        Self { tokens }
    }

    /// Add a token under an explicit variable name.
    pub fn with_token(mut self, name: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.tokens.insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token for `org/repo`, most specific first.
    pub fn lookup(&self, org: &str, repo: &str) -> Option<&str> {
        let org_key = format!("{GITHUB_TOKEN_ENV}__{}", env_segment(org));
        let repo_key = format!("{org_key}__{}", env_segment(repo));

        let token = [repo_key.as_str(), org_key.as_str(), GITHUB_TOKEN_ENV]
            .into_iter()
            .find_map(|key| self.tokens.get(key))
            .map(String::as_str);
        token
    }
}

/// Upper-case `value` and replace anything but ASCII alphanumerics with `_`.
fn env_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
