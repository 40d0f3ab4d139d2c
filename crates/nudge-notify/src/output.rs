//! Plain-text transport: prints every message instead of sending it.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::transport::{Recipient, Transport};

/// Writes each message to a sink (stdout by default). Never fails.
pub struct OutputTransport {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl OutputTransport {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

impl Default for OutputTransport {
    fn default() -> Self {
        Self::stdout()
    }
}

#[async_trait]
impl Transport for OutputTransport {
    fn name(&self) -> &'static str {
        "output"
    }

    async fn lookup_user(&self, email: &str) -> Result<Recipient> {
        Ok(Recipient {
            id: email.to_string(),
            display_name: None,
        })
    }

    async fn post_message(&self, _channel: &str, text: &str) -> Result<()> {
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(sink, "{text}").and_then(|_| sink.flush()) {
            warn!(error = %e, "failed to write reminder");
        }
        Ok(())
    }
}
