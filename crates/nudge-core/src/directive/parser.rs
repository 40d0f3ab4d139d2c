//! Recursive-descent parser for `TAG(key: value, ...)`.
//!
//! Grammar:
//!
//! ```text
//! tag_call := IDENT "(" [ kwarg { "," kwarg } [ "," ] ] ")"
//! kwarg    := IDENT ":" value
//! value    := STRING | INTEGER | IDENT [ "(" [ value { "," value } [ "," ] ] ")" ]
//! ```
//!
//! A bare identifier is a call without arguments. The parser accepts calls
//! nested to any depth (up to [`MAX_DEPTH`]); the compiler decides which
//! shapes are meaningful.

use crate::error::SyntaxError;

use super::lexer::{tokenize, Span, Token, TokenKind};

/// Hard limit on call nesting, keeps hostile input from blowing the stack.
pub const MAX_DEPTH: usize = 32;

/// A parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Call(CallExpr),
    Str { value: String, span: Span },
    Int { value: i64, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Call(call) => call.span,
            Expr::Str { span, .. } | Expr::Int { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordArg {
    pub key: String,
    pub key_span: Span,
    pub value: Expr,
}

/// The whole `TAG(...)` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCall {
    pub tag: String,
    pub args: Vec<KeywordArg>,
    pub span: Span,
}

/// Parse a tag line such as `TODO(on: date('2015-03-01'), to: 'a@b.co')`.
pub fn parse_tag_call(source: &str) -> Result<TagCall, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };

    let call = parser.tag_call()?;
    if let Some(token) = parser.peek() {
        return Err(SyntaxError::TrailingInput {
            found: token.kind.describe(),
            column: token.span.column(source),
        });
    }
    Ok(call)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, token: Option<&Token>, expected: &str) -> SyntaxError {
        match token {
            Some(token) => SyntaxError::UnexpectedToken {
                found: token.kind.describe(),
                column: token.span.column(self.source),
                expected: expected.to_string(),
            },
            None => SyntaxError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        match self.peek().cloned() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            other => Err(self.unexpected(other.as_ref(), expected)),
        }
    }

    fn ident(&mut self, expected: &str) -> Result<(String, Span), SyntaxError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) => {
                let result = (name.clone(), *span);
                self.pos += 1;
                Ok(result)
            }
            other => Err(self.unexpected(other, expected)),
        }
    }

    fn tag_call(&mut self) -> Result<TagCall, SyntaxError> {
        let (tag, tag_span) = self.ident("a tag name")?;
        self.expect(TokenKind::LParen, "`(`")?;

        let mut args = Vec::new();
        let close = loop {
            if let Some(TokenKind::RParen) = self.peek_kind() {
                break self.expect(TokenKind::RParen, "`)`")?;
            }

            args.push(self.keyword_arg()?);

            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::RParen) => {}
                _ => return Err(self.unexpected(self.peek(), "`,` or `)`")),
            }
        };

        Ok(TagCall {
            tag,
            args,
            span: tag_span.to(close.span),
        })
    }

    fn keyword_arg(&mut self) -> Result<KeywordArg, SyntaxError> {
        let (key, key_span) = self.ident("a keyword argument such as `on:`")?;
        self.expect(TokenKind::Colon, "`:` after keyword")?;
        let value = self.value(0)?;

        Ok(KeywordArg {
            key,
            key_span,
            value,
        })
    }

    fn value(&mut self, depth: usize) -> Result<Expr, SyntaxError> {
        if depth >= MAX_DEPTH {
            return Err(SyntaxError::NestingTooDeep { limit: MAX_DEPTH });
        }

        let token = self
            .advance()
            .ok_or_else(|| self.unexpected(None, "a value"))?;

        let span = token.span;
        match token.kind {
            TokenKind::Str(value) => Ok(Expr::Str { value, span }),
            TokenKind::Int(value) => Ok(Expr::Int { value, span }),
            TokenKind::Ident(name) => self.call_rest(name, span, depth),
            kind => Err(self.unexpected(Some(&Token { kind, span }), "a value")),
        }
    }

    fn call_rest(&mut self, name: String, name_span: Span, depth: usize) -> Result<Expr, SyntaxError> {
        if self.peek_kind() != Some(&TokenKind::LParen) {
            return Ok(Expr::Call(CallExpr {
                name,
                args: Vec::new(),
                span: name_span,
            }));
        }
        self.pos += 1;

        let mut args = Vec::new();
        let close = loop {
            if let Some(TokenKind::RParen) = self.peek_kind() {
                break self.expect(TokenKind::RParen, "`)`")?;
            }

            args.push(self.value(depth + 1)?);

            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::RParen) => {}
                _ => return Err(self.unexpected(self.peek(), "`,` or `)`")),
            }
        };

        Ok(Expr::Call(CallExpr {
            name,
            args,
            span: name_span.to(close.span),
        }))
    }
}
