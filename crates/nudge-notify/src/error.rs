//! Error types for message delivery.

use std::time::Duration;

use thiserror::Error;

/// API error codes meaning "this user or channel is gone".
pub const NOT_FOUND_CODES: [&str; 3] = ["users_not_found", "channel_not_found", "is_archived"];

/// Errors a [`Transport`](crate::Transport) can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// HTTP 429; `retry_after` comes from the `Retry-After` header
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// `{"ok": false, "error": code}`
    #[error("API error: {code}")]
    Api { code: String },

    /// Non-success HTTP status
    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Unparsable response body
    #[error("JSON parsing error: {0}")]
    Json(String),

    /// Transport built without credentials
    #[error("missing Slack token")]
    MissingToken,
}

impl TransportError {
    /// Logical API error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            TransportError::Api { code } => Some(code),
            _ => None,
        }
    }

    /// Whether the recipient does not exist (any more) and the unit should be
    /// rerouted to the fallback channel.
    pub fn is_not_found(&self) -> bool {
        self.code().is_some_and(|c| NOT_FOUND_CODES.contains(&c))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Json(err.to_string())
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        for code in NOT_FOUND_CODES {
            assert!(TransportError::Api {
                code: code.to_string()
            }
            .is_not_found());
        }
        assert!(!TransportError::Api {
            code: "invalid_auth".to_string()
        }
        .is_not_found());
        assert!(!TransportError::Http {
            status: 404,
            body: String::new()
        }
        .is_not_found());
    }
}
