//! Error types for condition checks.

use thiserror::Error;

use nudge_core::VersionError;

use crate::registry::Arity;

/// Errors raised while resolving or running a check.
#[derive(Error, Debug)]
pub enum CheckError {
    /// No check registered under this name
    #[error("unknown event `{name}`")]
    UnknownCheck { name: String },

    /// Wrong number of arguments
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: Arity,
        got: usize,
    },

    /// Argument of the wrong literal type
    #[error("argument {position} of `{name}` must be a {expected}, got {got}")]
    ArgumentType {
        name: String,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    /// Date that none of the supported formats accept
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    /// Malformed version or requirement
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status that is not a client error
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unreadable dependency lockfile
    #[error("invalid lockfile: {0}")]
    Lockfile(String),

    /// Failure reported by a host-registered check
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        CheckError::Http(err.to_string())
    }
}

/// Result type for check operations
pub type Result<T> = std::result::Result<T, CheckError>;
