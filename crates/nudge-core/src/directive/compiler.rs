use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::scanner::CandidateBlock;

use super::lexer::Span;
use super::parser::{parse_tag_call, CallExpr, Expr, KeywordArg};
use super::{is_email, Argument, Directive, Event, SourceLocation};

fn context_regex() -> &'static Regex {
    static CONTEXT: OnceLock<Regex> = OnceLock::new();
    CONTEXT.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)#(\d+)$").expect("valid context regex")
    })
}

/// Compile the tag text (`TODO(...)`) into a [`Directive`].
///
/// Never fails: syntax problems become exactly one parse error and
/// semantic problems are collected per keyword.
pub fn compile(tag_text: &str, location: SourceLocation) -> Directive {
    let mut directive = Directive {
        location,
        ..Default::default()
    };

    let call = match parse_tag_call(tag_text) {
        Ok(call) => call,
        Err(err) => {
            directive
                .parse_errors
                .push(format!("Invalid directive syntax: {err}"));
            return directive;
        }
    };

    let line = directive.location.start_line;
    for arg in &call.args {
        apply_keyword(&mut directive, tag_text, line, arg);
    }

    directive
}

/// Compile a scanned block, carrying over its body and line range.
pub fn compile_block(block: &CandidateBlock, file: &str) -> Directive {
    let location = SourceLocation::new(file).with_lines(block.start_line, block.end_line());
    let mut directive = compile(&block.tag_text, location);
    directive.body = block.body();
    directive
}

fn apply_keyword(directive: &mut Directive, source: &str, line: Option<usize>, arg: &KeywordArg) {
    let text = arg.value.span().slice(source);

    match arg.key.as_str() {
        "on" => match event_from(&arg.value, source, line) {
            Some(event) => directive.events.push(event),
            None => directive
                .parse_errors
                .push(format!("Incorrect `:on` event format: {text}")),
        },
        "to" => match &arg.value {
            Expr::Str { value, .. } => directive.assignees.push(value.clone()),
            _ => directive
                .parse_errors
                .push(format!("Incorrect `:to` assignee format: {text}")),
        },
        "owner" => match &arg.value {
            Expr::Str { value, .. } if is_email(value) => directive.owner = Some(value.clone()),
            _ => directive.parse_errors.push(format!(
                "Incorrect `:owner` format: expected an email address, got {text}"
            )),
        },
        "context" => match context_event(&arg.value, source, line) {
            Some(event) => directive.context = Some(event),
            None => directive.parse_errors.push(format!(
                "Incorrect `:context` format: expected \"org/repo#number\", got {text}"
            )),
        },
        other => debug!(keyword = other, "ignoring unknown directive keyword"),
    }
}

fn event_from(value: &Expr, source: &str, line: Option<usize>) -> Option<Event> {
    let Expr::Call(CallExpr { name, args, span }) = value else {
        return None;
    };

    let arguments = args
        .iter()
        .map(|arg| match arg {
            Expr::Str { value, .. } => Some(Argument::Str(value.clone())),
            Expr::Int { value, .. } => Some(Argument::Int(*value)),
            Expr::Call(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some(located_event(name.clone(), arguments, *span, source, line))
}

fn context_event(value: &Expr, source: &str, line: Option<usize>) -> Option<Event> {
    let Expr::Str { value, span } = value else {
        return None;
    };
    let caps = context_regex().captures(value)?;
    let number: i64 = caps[3].parse().ok()?;

    Some(located_event(
        "issue_context".to_string(),
        vec![
            Argument::Str(caps[1].to_string()),
            Argument::Str(caps[2].to_string()),
            Argument::Int(number),
        ],
        *span,
        source,
        line,
    ))
}

fn located_event(
    method_name: String,
    arguments: Vec<Argument>,
    span: Span,
    source: &str,
    line: Option<usize>,
) -> Event {
    Event {
        method_name,
        arguments,
        line,
        column: span.column(source),
        source: span.slice(source).to_string(),
    }
}
