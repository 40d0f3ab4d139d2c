//! nudge notify
//!
//! Renders reminders for fired directives and delivers them:
//!
//! - [`Reminder`]: the message for one directive, rendered per [`DeliveryTarget`]
//! - [`Dispatcher`]: bounded worker pool with rate-limit retry and fallback routing
//! - [`Transport`]: the delivery seam, implemented by [`SlackTransport`] and
//!   [`OutputTransport`]
//! - [`DeepLinkConfig`]: CI-derived links back to the source file

pub mod deep_link;
pub mod dispatcher;
mod error;
pub mod fakes;
mod message;
mod output;
mod slack;
mod transport;

pub use deep_link::{DeepLink, DeepLinkConfig};
pub use dispatcher::{DeliveryReport, DispatchConfig, Dispatcher, RetryPolicy};
pub use error::{Result, TransportError, NOT_FOUND_CODES};
pub use message::{DeliveryTarget, Reminder};
pub use output::OutputTransport;
pub use slack::{SlackConfig, SlackTransport, SLACK_TOKEN_ENV};
pub use transport::{Recipient, Transport};
