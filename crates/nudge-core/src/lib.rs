//! nudge core library
//!
//! Synchronous building blocks of the reminder pipeline:
//!
//! - [`comment`]: pulls comments out of a Ruby source file
//! - [`scanner`]: groups tagged comments with their continuation lines
//! - [`directive`]: lexes, parses and compiles the `TODO(...)` call syntax
//! - [`version`]: version requirement matching used by the version checks
//! - [`telemetry`] / [`obs`]: subscriber setup and run lifecycle events
//!
//! Scanning and compiling never touch the network; the network-facing halves
//! live in `nudge-checks` and `nudge-notify`.

pub mod comment;
pub mod directive;
pub mod error;
pub mod obs;
pub mod scanner;
pub mod telemetry;
pub mod version;

pub use comment::{extract_comments, Comment};
pub use directive::{
    compile, compile_block, is_email, Argument, Directive, Event, SourceLocation,
    REFERENCE_EVENTS,
};
pub use error::{CommentError, SyntaxError, VersionError};
pub use obs::{
    emit_delivery_finished, emit_directive_fired, emit_run_finished, emit_run_started, run_span,
};
pub use scanner::{CandidateBlock, Scanner, ScannerConfig, CONTINUATION_INDENT, DEFAULT_TAGS};
pub use telemetry::init_tracing;
pub use version::{Requirement, Version};

/// nudge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
