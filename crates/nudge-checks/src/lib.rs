//! nudge checks
//!
//! Turns compiled directives into verdicts:
//!
//! - [`Registry`]: event name to [`Check`], with declared arity and kind
//! - [`checks`]: the built-in date, package, issue and runtime checks
//! - [`Evaluator`]: first-match evaluation of a directive's events
//! - [`RegistryClient`] / [`GitHubClient`]: the HTTP clients behind the
//!   [`PackageIndex`] and [`IssueTracker`] seams
//!
//! Endpoints and credentials are captured once in [`NudgeConfig`] and
//! [`TokenSet`]; checks never read the environment themselves.

pub mod checks;
mod config;
mod context;
mod error;
pub mod evaluator;
pub mod fakes;
mod http;
mod issue_tracker;
mod lockfile;
mod package_index;
mod registry;

pub use config::{NudgeConfig, TokenSet, GITHUB_TOKEN_ENV};
pub use context::{detect_runtime_version, CheckContext};
pub use error::{CheckError, Result};
pub use evaluator::{Evaluation, EvaluationOutcome, Evaluator};
pub use issue_tracker::{GitHubClient, Issue, IssueAssignee, IssueKind, IssueTracker};
pub use lockfile::LockedDependencies;
pub use package_index::{PackageIndex, RegistryClient};
pub use registry::{Arity, Check, CheckKind, CheckOutcome, RegisteredCheck, Registry};
