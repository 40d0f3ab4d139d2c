//! In-memory transport (testing only)
//!
//! `MemoryTransport` resolves any email to a user, records every posted
//! message and can be scripted to fail specific calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, TransportError};
use crate::transport::{Recipient, Transport};

/// A message accepted by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct Script {
    lookup_errors: HashMap<String, VecDeque<TransportError>>,
    post_errors: HashMap<String, VecDeque<TransportError>>,
    names: HashMap<String, String>,
}

/// Recording transport with per-recipient scripted failures.
///
/// Scripted errors are consumed in order; once a queue is empty the call
/// succeeds. Users resolve to `U:<email>`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    script: Mutex<Script>,
    posted: Mutex<Vec<PostedMessage>>,
    calls: Mutex<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the user behind `email` a first name.
    pub fn with_name(self, email: &str, first_name: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .names
            .insert(email.to_string(), first_name.to_string());
        self
    }

    /// Fail the next lookup of `email` with `error`.
    pub fn fail_lookup(self, email: &str, error: TransportError) -> Self {
        self.script
            .lock()
            .unwrap()
            .lookup_errors
            .entry(email.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Fail the next post to `channel` with `error`.
    pub fn fail_post(self, channel: &str, error: TransportError) -> Self {
        self.script
            .lock()
            .unwrap()
            .post_errors
            .entry(channel.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Messages accepted so far, in arrival order.
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().unwrap().clone()
    }

    /// Total calls made, failed ones included.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn lookup_user(&self, email: &str) -> Result<Recipient> {
        *self.calls.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        if let Some(error) = script
            .lookup_errors
            .get_mut(email)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        Ok(Recipient {
            id: format!("U:{email}"),
            display_name: script.names.get(email).cloned(),
        })
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        let scripted = self
            .script
            .lock()
            .unwrap()
            .post_errors
            .get_mut(channel)
            .and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }

        self.posted.lock().unwrap().push(PostedMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
