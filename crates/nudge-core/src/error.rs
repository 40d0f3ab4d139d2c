//! Error taxonomy for the pure parsing layer.

/// Errors produced while tokenizing or parsing a directive call.
///
/// Columns are 1-based character offsets into the tag text
/// (`TODO(...)`), which is what users see in their editor after the `# `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected character `{ch}` at column {column}")]
    UnexpectedCharacter { ch: char, column: usize },

    #[error("unterminated string starting at column {column}")]
    UnterminatedString { column: usize },

    #[error("integer literal at column {column} is out of range")]
    IntegerOverflow { column: usize },

    #[error("unexpected `{found}` at column {column}, expected {expected}")]
    UnexpectedToken {
        found: String,
        column: usize,
        expected: String,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("unexpected trailing input `{found}` at column {column}")]
    TrailingInput { found: String, column: usize },

    #[error("calls nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Errors produced while parsing versions and version requirements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("malformed version number string {0:?}")]
    InvalidVersion(String),

    #[error("illformed requirement {0:?}")]
    InvalidRequirement(String),
}

/// Errors produced while pulling comments out of a source file.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("failed to load the Ruby grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("source file could not be parsed")]
    Parse,
}
