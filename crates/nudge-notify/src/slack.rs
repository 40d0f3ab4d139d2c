//! Slack Web API transport
//!
//! Uses `users.lookupByEmail` to resolve assignees and `chat.postMessage` to
//! deliver. A `200` response with `"ok": false` is a logical failure and is
//! reported as [`TransportError::Api`] with Slack's error code.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::transport::{Recipient, Transport};

const DEFAULT_SLACK_API_URL: &str = "https://slack.com";

/// Environment variable holding the bot token.
pub const SLACK_TOKEN_ENV: &str = "NUDGE_SLACK_TOKEN";

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// API base URL
    pub api_url: String,
    /// Bot token
    pub token: Option<String>,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        SlackConfig {
            api_url: std::env::var("NUDGE_SLACK_API_URL")
                .unwrap_or_else(|_| DEFAULT_SLACK_API_URL.to_string()),
            token: std::env::var(SLACK_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
            read_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            user_agent: format!("nudge/{}", nudge_core::VERSION),
        }
    }
}

impl SlackConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the bot token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Point the client at another API host
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    first_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack client
pub struct SlackTransport {
    api_url: String,
    token: String,
    http_client: Client,
}

impl SlackTransport {
    /// Build a client; fails when no token is configured.
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or(TransportError::MissingToken)?;

        let http_client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()?;

        Ok(SlackTransport {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            http_client,
        })
    }

    async fn call(&self, request: RequestBuilder, method: &str) -> Result<Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;
        let status = response.status();
        debug!(method = %method, status = status.as_u16(), "slack response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(TransportError::RateLimited { retry_after });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        if value.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(value)
        } else {
            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            Err(TransportError::Api { code })
        }
    }
}

#[async_trait]
impl Transport for SlackTransport {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn lookup_user(&self, email: &str) -> Result<Recipient> {
        let request = self
            .http_client
            .get(format!("{}/api/users.lookupByEmail", self.api_url))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .query(&[("email", email)]);

        let body = self.call(request, "users.lookupByEmail").await?;
        let lookup: LookupResponse = serde_json::from_value(body)?;

        Ok(Recipient {
            id: lookup.user.id,
            display_name: lookup.user.profile.first_name.filter(|n| !n.is_empty()),
        })
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let payload = serde_json::to_string(&PostMessage { channel, text })?;
        let request = self
            .http_client
            .post(format!("{}/api/chat.postMessage", self.api_url))
            .header("Content-Type", "application/json; charset=utf8")
            .body(payload);

        self.call(request, "chat.postMessage").await.map(|_| ())
    }
}
