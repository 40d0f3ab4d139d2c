//! Built-in checks.

mod date;
mod issue;
mod package;
mod runtime;

pub use date::{parse_timestamp, DateCheck};
pub use issue::{IssueCloseCheck, IssueReferenceCheck, ReferenceStyle};
pub use package::{PackageBumpCheck, PackageReleaseCheck};
pub use runtime::RuntimeVersionCheck;

use nudge_core::Argument;

use crate::error::{CheckError, Result};
use crate::issue_tracker::IssueKind;
use crate::registry::{Arity, CheckKind, Registry};

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry
        .register("date", Arity::Exactly(1), CheckKind::Trigger, DateCheck)
        .register(
            "package_release",
            Arity::AtLeast(1),
            CheckKind::Trigger,
            PackageReleaseCheck,
        )
        .register(
            "package_bump",
            Arity::AtLeast(1),
            CheckKind::Trigger,
            PackageBumpCheck,
        )
        .register(
            "issue_close",
            Arity::Exactly(3),
            CheckKind::Trigger,
            IssueCloseCheck::new(IssueKind::Issue),
        )
        .register(
            "pull_request_close",
            Arity::Exactly(3),
            CheckKind::Trigger,
            IssueCloseCheck::new(IssueKind::PullRequest),
        )
        .register(
            "runtime_version",
            Arity::AtLeast(0),
            CheckKind::Trigger,
            RuntimeVersionCheck,
        )
        .register(
            "issue_pin",
            Arity::Exactly(3),
            CheckKind::Reference,
            IssueReferenceCheck::new(ReferenceStyle::Pin),
        )
        .register(
            "issue_context",
            Arity::Exactly(3),
            CheckKind::Reference,
            IssueReferenceCheck::new(ReferenceStyle::Context),
        )
        .alias("gem_release", "package_release")
        .alias("gem_bump", "package_bump")
        .alias("ruby_version", "runtime_version");
}

/// String argument at `position` (0-based).
pub(crate) fn string_arg<'a>(name: &str, args: &'a [Argument], position: usize) -> Result<&'a str> {
    match args.get(position) {
        Some(Argument::Str(s)) => Ok(s),
        Some(other) => Err(CheckError::ArgumentType {
            name: name.to_string(),
            position: position + 1,
            expected: "string",
            got: other.kind(),
        }),
        None => Err(CheckError::Other(format!(
            "`{name}` is missing argument {}",
            position + 1
        ))),
    }
}

/// All string arguments starting at `from`.
pub(crate) fn string_args<'a>(name: &str, args: &'a [Argument], from: usize) -> Result<Vec<&'a str>> {
    (from..args.len()).map(|i| string_arg(name, args, i)).collect()
}

/// Issue number, written either as a string or an integer.
pub(crate) fn number_arg(name: &str, args: &[Argument], position: usize) -> Result<String> {
    match args.get(position) {
        Some(Argument::Int(n)) => Ok(n.to_string()),
        Some(Argument::Str(_)) => string_arg(name, args, position).map(str::to_string),
        None => Err(CheckError::Other(format!(
            "`{name}` is missing argument {}",
            position + 1
        ))),
    }
}
