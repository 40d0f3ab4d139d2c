//! Tokenizer for the directive call syntax.
//!
//! Produces identifiers, string literals (single or double quoted), integer
//! literals and the punctuation `(`, `)`, `,`, `:`. Every token carries the
//! byte span it was read from so that error messages can quote the source.

use crate::error::SyntaxError;

/// Byte range into the tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// 1-based character column of the span start in `source`.
    pub fn column(&self, source: &str) -> usize {
        column_at(source, self.start)
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    Comma,
    Colon,
}

impl TokenKind {
    /// Short human-readable description used in "expected ..." messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Str(value) => format!("{value:?}"),
            TokenKind::Int(value) => value.to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub(crate) fn column_at(source: &str, byte_offset: usize) -> usize {
    source
        .get(..byte_offset)
        .map(|prefix| prefix.chars().count() + 1)
        .unwrap_or(1)
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        let single = |kind: TokenKind| Token {
            kind,
            span: Span::new(start, start + ch.len_utf8()),
        };

        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(single(TokenKind::LParen));
            }
            ')' => {
                chars.next();
                tokens.push(single(TokenKind::RParen));
            }
            ',' => {
                chars.next();
                tokens.push(single(TokenKind::Comma));
            }
            ':' => {
                chars.next();
                tokens.push(single(TokenKind::Colon));
            }
            '\'' | '"' => {
                chars.next();
                let mut value = String::new();
                let mut end = None;

                while let Some((idx, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => push_escaped(&mut value, ch, escaped),
                            None => break,
                        },
                        c if c == ch => {
                            end = Some(idx + c.len_utf8());
                            break;
                        }
                        c => value.push(c),
                    }
                }

                let end = end.ok_or(SyntaxError::UnterminatedString {
                    column: column_at(source, start),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    span: Span::new(start, end),
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut end = start + c.len_utf8();
                let mut digits = String::from(c);

                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                    } else if c != '_' {
                        break;
                    }
                    end = idx + c.len_utf8();
                    chars.next();
                }

                if digits == "-" {
                    return Err(SyntaxError::UnexpectedCharacter {
                        ch: '-',
                        column: column_at(source, start),
                    });
                }

                let value = digits.parse::<i64>().map_err(|_| SyntaxError::IntegerOverflow {
                    column: column_at(source, start),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Int(value),
                    span: Span::new(start, end),
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                let mut name = String::new();

                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }

                // Ruby-style predicate and bang method names.
                if let Some(&(idx, c @ ('?' | '!'))) = chars.peek() {
                    name.push(c);
                    end = idx + 1;
                    chars.next();
                }

                tokens.push(Token {
                    kind: TokenKind::Ident(name),
                    span: Span::new(start, end),
                });
            }
            other => {
                return Err(SyntaxError::UnexpectedCharacter {
                    ch: other,
                    column: column_at(source, start),
                });
            }
        }
    }

    Ok(tokens)
}

// Single-quoted strings only unescape `\\` and `\'`, like Ruby.
fn push_escaped(value: &mut String, quote: char, escaped: char) {
    match (quote, escaped) {
        ('"', 'n') => value.push('\n'),
        ('"', 't') => value.push('\t'),
        ('\'', '\\' | '\'') | ('"', _) => value.push(escaped),
        ('\'', other) => {
            value.push('\\');
            value.push(other);
        }
        _ => value.push(escaped),
    }
}
