//! Structured directives compiled from tagged comment blocks.
//!
//! A directive is built once per [`CandidateBlock`](crate::scanner::CandidateBlock)
//! by [`compile`] / [`compile_block`] and never changes afterwards. Compile
//! problems are collected in [`Directive::parse_errors`] instead of being
//! returned as `Err`, so one malformed comment never stops a run.

mod compiler;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use compiler::{compile, compile_block};

/// Events that describe a resource instead of waiting for a condition.
/// A directive made only of these does not need an assignee.
pub const REFERENCE_EVENTS: [&str; 1] = ["issue_pin"];

/// A literal argument of an event call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Str(String),
    Int(i64),
}

impl Argument {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::Str(s) => Some(s),
            Argument::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Argument::Int(n) => Some(*n),
            Argument::Str(_) => None,
        }
    }

    /// Short type name used in argument errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Argument::Str(_) => "string",
            Argument::Int(_) => "integer",
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Str(s) => f.write_str(s),
            Argument::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Str(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Str(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Int(value)
    }
}

/// A named condition check and its literal arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub method_name: String,
    pub arguments: Vec<Argument>,
    /// Line of the tag comment, when known.
    pub line: Option<usize>,
    /// 1-based column of the call inside the tag text.
    pub column: usize,
    /// The call as written, e.g. `date('2015-03-01')`.
    pub source: String,
}

impl Event {
    pub fn new<S, I, A>(method_name: S, arguments: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        let method_name = method_name.into();
        let arguments: Vec<Argument> = arguments.into_iter().map(Into::into).collect();
        let source = format!(
            "{}({})",
            method_name,
            arguments
                .iter()
                .map(|a| match a {
                    Argument::Str(s) => format!("{s:?}"),
                    Argument::Int(n) => n.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self {
            method_name,
            arguments,
            line: None,
            column: 1,
            source,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Where a directive was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            start_line: None,
            end_line: None,
        }
    }

    pub fn with_lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = Some(start_line);
        self.end_line = Some(end_line);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start_line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => f.write_str(&self.file),
        }
    }
}

/// One compiled tagged comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub events: Vec<Event>,
    pub assignees: Vec<String>,
    pub owner: Option<String>,
    pub context: Option<Event>,
    pub body: String,
    pub location: SourceLocation,
    pub parse_errors: Vec<String>,
}

impl Directive {
    /// Events present and no compile errors.
    pub fn is_evaluable(&self) -> bool {
        self.parse_errors.is_empty() && !self.events.is_empty()
    }

    /// Evaluable and somebody to tell, unless the directive only references
    /// a resource.
    pub fn is_valid(&self) -> bool {
        self.is_evaluable()
            && (!self.assignees.is_empty()
                || self
                    .primary_event()
                    .is_some_and(|e| REFERENCE_EVENTS.contains(&e.method_name.as_str())))
    }

    pub fn primary_event(&self) -> Option<&Event> {
        self.events.first()
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

/// Whether `value` looks like an email address.
pub fn is_email(value: &str) -> bool {
    email_regex().is_match(value)
}
