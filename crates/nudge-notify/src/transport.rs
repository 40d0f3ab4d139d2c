//! The delivery seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Identifier messages are posted to.
    pub id: String,
    /// First name used in the greeting, when the directory has one.
    pub display_name: Option<String>,
}

/// Something that can resolve users and post messages.
///
/// Implementations make exactly one attempt per call; rate limits surface as
/// [`TransportError::RateLimited`](crate::TransportError::RateLimited) and
/// the dispatcher decides whether to wait and retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Resolve an email address to a user.
    async fn lookup_user(&self, email: &str) -> Result<Recipient>;

    /// Post `text` to a user id or channel.
    async fn post_message(&self, channel: &str, text: &str) -> Result<()>;
}
