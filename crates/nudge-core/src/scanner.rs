//! Groups tagged comments with their continuation lines.
//!
//! A tag line looks like `# TODO(...)`: the `#` marker, exactly one
//! whitespace character, one of the configured tags and an opening paren.
//! The comment lines that follow belong to the same block only when they are
//! indented exactly [`CONTINUATION_INDENT`] characters deeper than the tag
//! line. Anything else closes the block and is otherwise ignored, so an
//! ordinary comment sitting under a directive never becomes an error.

use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::error::CommentError;

/// Tags recognised when no explicit set is configured.
pub const DEFAULT_TAGS: [&str; 3] = ["TODO", "FIXME", "OPTIMIZE"];

/// Extra indentation that marks a comment as part of the directive body.
pub const CONTINUATION_INDENT: usize = 2;

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Upper-case markers that open a directive block.
    pub tags: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ScannerConfig {
    /// Replace the recognised tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A tagged comment line plus its continuation lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBlock {
    /// The tag that opened the block (`TODO`, `FIXME`, ...).
    pub tag: String,
    /// Tag line text with the comment marker stripped, e.g. `TODO(on: ...)`.
    pub tag_text: String,
    /// Indentation of the tag line after the `#` marker.
    pub indent: usize,
    /// Continuation lines with the marker and indentation stripped.
    pub body_lines: Vec<String>,
    /// 1-based line of the tag comment.
    pub start_line: usize,
}

impl CandidateBlock {
    /// Last line covered by the block.
    pub fn end_line(&self) -> usize {
        self.start_line + self.body_lines.len()
    }

    /// Continuation lines joined back together, each terminated by `\n`.
    pub fn body(&self) -> String {
        self.body_lines.iter().fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push('\n');
            acc
        })
    }

    fn accepts(&self, comment: &Comment) -> bool {
        comment.indentation() == self.indent + CONTINUATION_INDENT
    }
}

/// Comment-stream scanner.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Return the tag when `text` opens a directive block.
    pub fn match_tag(&self, text: &str) -> Option<&str> {
        let rest = text.strip_prefix('#')?;
        let mut chars = rest.chars();
        if !chars.next()?.is_whitespace() {
            return None;
        }
        let rest = chars.as_str();

        self.config.tags.iter().map(String::as_str).find(|tag| {
            rest.strip_prefix(tag)
                .is_some_and(|after| after.starts_with('('))
        })
    }

    /// Group `comments` into candidate blocks, in source order.
    pub fn scan<'a, I>(&self, comments: I) -> Vec<CandidateBlock>
    where
        I: IntoIterator<Item = &'a Comment>,
    {
        let mut blocks = Vec::new();
        let mut current: Option<CandidateBlock> = None;

        for comment in comments {
            if !comment.inline {
                continue;
            }

            if let Some(tag) = self.match_tag(&comment.text) {
                blocks.extend(current.take());
                current = Some(CandidateBlock {
                    tag: tag.to_string(),
                    tag_text: comment.content().to_string(),
                    indent: comment.indentation(),
                    body_lines: Vec::new(),
                    start_line: comment.line,
                });
                continue;
            }

            match current.as_mut() {
                Some(block) if block.accepts(comment) => {
                    block.body_lines.push(comment.content().to_string());
                }
                _ => blocks.extend(current.take()),
            }
        }

        blocks.extend(current);
        blocks
    }

    /// Extract comments from `source` and scan them.
    pub fn scan_source(&self, source: &str) -> Result<Vec<CandidateBlock>, CommentError> {
        let comments = crate::comment::extract_comments(source)?;
        Ok(self.scan(&comments))
    }
}
