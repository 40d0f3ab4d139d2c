//! Reminder text.

use serde::{Deserialize, Serialize};

use nudge_core::Directive;

use crate::deep_link::DeepLinkConfig;

/// Where a delivery unit ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryTarget {
    User {
        id: String,
        display_name: Option<String>,
    },
    Channel {
        id: String,
    },
    /// The assignee could not be reached; `original_assignee` is named in
    /// the message.
    FallbackChannel {
        id: String,
        original_assignee: String,
    },
}

impl DeliveryTarget {
    pub fn id(&self) -> &str {
        match self {
            DeliveryTarget::User { id, .. }
            | DeliveryTarget::Channel { id }
            | DeliveryTarget::FallbackChannel { id, .. } => id,
        }
    }

    pub fn is_channel(&self) -> bool {
        !matches!(self, DeliveryTarget::User { .. })
    }
}

/// Everything needed to tell assignees that a directive fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub assignees: Vec<String>,
    pub owner: Option<String>,
    pub file: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    /// Satisfaction (or inconclusive) message of the event.
    pub event_message: String,
    /// Context and pinned-issue lines.
    pub references: Vec<String>,
    pub body: String,
}

impl Reminder {
    pub fn from_directive(directive: &Directive, event_message: &str, references: Vec<String>) -> Self {
        Self {
            assignees: directive.assignees.clone(),
            owner: directive.owner.clone(),
            file: directive.location.file.clone(),
            start_line: directive.location.start_line,
            end_line: directive.location.end_line,
            event_message: event_message.to_string(),
            references,
            body: directive.body.clone(),
        }
    }

    fn file_reference(&self, deep_link: Option<&DeepLinkConfig>) -> String {
        deep_link
            .and_then(|config| config.link(&self.file, self.start_line, self.end_line))
            .map(|link| link.markup())
            .unwrap_or_else(|| format!("`{}`", self.file))
    }

    /// Message text for one target.
    pub fn render(&self, target: &DeliveryTarget, deep_link: Option<&DeepLinkConfig>) -> String {
        let header = match target {
            DeliveryTarget::User {
                display_name: Some(name),
                ..
            } => format!("Hello {name} :wave:,"),
            DeliveryTarget::FallbackChannel {
                original_assignee, ..
            } => format!(
                "Hello :wave:,\n\n`{original_assignee}` had an assigned TODO but this user or channel doesn't exist on Slack anymore."
            ),
            _ => "Hello :wave:,".to_string(),
        };

        let mut text = format!(
            "{header}\n\nYou have an assigned TODO in the {} file.\n{}\n",
            self.file_reference(deep_link),
            self.event_message.trim_end()
        );

        for line in &self.references {
            text.push_str(line.trim_end());
            text.push('\n');
        }

        if let (true, Some(owner)) = (target.is_channel(), &self.owner) {
            text.push_str(&format!("This TODO is owned by {owner}.\n"));
        }

        let body = self.body.trim();
        if !body.is_empty() {
            text.push_str(&format!(
                "\nHere is the associated comment on your TODO:\n\n```\n{body}\n```\n"
            ));
        }

        text
    }
}
