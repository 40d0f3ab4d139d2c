//! Comment extraction for Ruby sources.
//!
//! `#` comments, whether on their own line or trailing code, are reported
//! as inline comments. `=begin` / `=end` documentation blocks come back as
//! a single non-inline comment so the scanner can skip them.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use crate::error::CommentError;

/// A single comment from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Raw comment text starting at the `#` marker.
    pub text: String,
    /// 1-based line number of the first line.
    pub line: usize,
    /// `true` for `#` comments, `false` for embedded documentation blocks.
    pub inline: bool,
}

impl Comment {
    pub fn inline(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
            inline: true,
        }
    }

    /// Number of whitespace characters between the `#` marker and the
    /// comment content.
    pub fn indentation(&self) -> usize {
        self.text
            .strip_prefix('#')
            .map(|rest| rest.chars().take_while(|c| c.is_whitespace()).count())
            .unwrap_or(0)
    }

    /// Comment content with the marker and its indentation stripped.
    pub fn content(&self) -> &str {
        self.text
            .strip_prefix('#')
            .map(|rest| rest.trim_start())
            .unwrap_or(&self.text)
    }
}

/// Extract every comment from `source`, in file order.
///
/// The source is parsed as Ruby, so `#` inside strings, heredocs and
/// interpolation is never mistaken for a comment while trailing comments
/// after code are found.
pub fn extract_comments(source: &str) -> Result<Vec<Comment>, CommentError> {
    let mut parser = Parser::new();
    parser.set_language(tree_sitter_ruby::language())?;
    let tree = parser.parse(source, None).ok_or(CommentError::Parse)?;

    let mut comments = Vec::new();
    let mut cursor = tree.walk();
    'walk: loop {
        let node = cursor.node();
        if node.kind() == "comment" {
            comments.extend(to_comment(node, source));
        } else if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    Ok(comments)
}

fn to_comment(node: Node<'_>, source: &str) -> Option<Comment> {
    let text = source.get(node.byte_range())?.trim_end();
    Some(Comment {
        text: text.to_string(),
        line: node.start_position().row + 1,
        inline: !text.starts_with("=begin"),
    })
}
