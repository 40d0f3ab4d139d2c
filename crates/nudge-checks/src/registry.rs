//! Name-to-check registry.
//!
//! Every event name that may appear in an `on:` clause maps to one
//! [`RegisteredCheck`]: the check itself, the number of arguments it takes
//! and whether it is a trigger or a pure reference. Host applications add
//! their own checks through [`Registry::register`] / [`Registry::register_fn`]
//! before the run starts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use nudge_core::{Argument, Event};

use crate::context::CheckContext;
use crate::error::{CheckError, Result};

/// Accepted argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Whether an event can fire a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Condition that may become true over time.
    Trigger,
    /// Describes a resource; never fires, only enriches messages.
    Reference,
}

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Condition holds; message for the assignee.
    Met(String),
    /// Condition does not hold yet.
    Unmet,
    /// State could not be determined; message explains why.
    Inconclusive(String),
}

/// A condition check.
#[async_trait]
pub trait Check: Send + Sync {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome>;
}

/// Adapter that lets a plain closure act as a [`Check`].
struct FnCheck<F>(F);

#[async_trait]
impl<F> Check for FnCheck<F>
where
    F: Fn(&CheckContext, &[Argument]) -> Result<CheckOutcome> + Send + Sync,
{
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        (self.0)(ctx, args)
    }
}

/// A check plus its declared signature.
#[derive(Clone)]
pub struct RegisteredCheck {
    pub arity: Arity,
    pub kind: CheckKind,
    check: Arc<dyn Check>,
}

impl RegisteredCheck {
    pub fn check(&self) -> &dyn Check {
        self.check.as_ref()
    }
}

impl fmt::Debug for RegisteredCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCheck")
            .field("arity", &self.arity)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    checks: HashMap<String, RegisteredCheck>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in check and its legacy aliases.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::checks::register_builtins(&mut registry);
        registry
    }

    /// Register `check` under `name`, replacing any previous entry.
    pub fn register<C>(&mut self, name: &str, arity: Arity, kind: CheckKind, check: C) -> &mut Self
    where
        C: Check + 'static,
    {
        self.insert(name, arity, kind, Arc::new(check))
    }

    /// Register a synchronous closure as a trigger check.
    pub fn register_fn<F>(&mut self, name: &str, arity: Arity, f: F) -> &mut Self
    where
        F: Fn(&CheckContext, &[Argument]) -> Result<CheckOutcome> + Send + Sync + 'static,
    {
        self.insert(name, arity, CheckKind::Trigger, Arc::new(FnCheck(f)))
    }

    /// Make `alias` resolve to whatever `name` is registered as.
    pub fn alias(&mut self, alias: &str, name: &str) -> &mut Self {
        if let Some(entry) = self.checks.get(name).cloned() {
            self.checks.insert(alias.to_string(), entry);
        }
        self
    }

    fn insert(&mut self, name: &str, arity: Arity, kind: CheckKind, check: Arc<dyn Check>) -> &mut Self {
        self.checks.insert(
            name.to_string(),
            RegisteredCheck { arity, kind, check },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCheck> {
        self.checks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look `event` up and check its argument count.
    pub fn resolve(&self, event: &Event) -> Result<&RegisteredCheck> {
        let entry = self
            .checks
            .get(&event.method_name)
            .ok_or_else(|| CheckError::UnknownCheck {
                name: event.method_name.clone(),
            })?;

        if !entry.arity.accepts(event.arguments.len()) {
            return Err(CheckError::Arity {
                name: event.method_name.clone(),
                expected: entry.arity,
                got: event.arguments.len(),
            });
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert!(Arity::Exactly(1).accepts(1));
        assert!(!Arity::Exactly(1).accepts(2));
        assert!(Arity::AtLeast(1).accepts(3));
        assert!(!Arity::AtLeast(1).accepts(0));
        assert_eq!(Arity::AtLeast(2).to_string(), "at least 2");
    }

    #[test]
    fn test_builtins_and_aliases_are_registered() {
        let registry = Registry::with_builtins();
        for name in [
            "date",
            "package_release",
            "gem_release",
            "package_bump",
            "gem_bump",
            "issue_close",
            "pull_request_close",
            "runtime_version",
            "ruby_version",
            "issue_pin",
            "issue_context",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert_eq!(registry.get("issue_pin").unwrap().kind, CheckKind::Reference);
        assert_eq!(registry.get("gem_bump").unwrap().arity, Arity::AtLeast(1));
    }

    #[test]
    fn test_resolve_reports_unknown_and_arity() {
        let registry = Registry::with_builtins();

        let err = registry.resolve(&Event::new("trello_card_close", [1_i64])).unwrap_err();
        assert!(matches!(err, CheckError::UnknownCheck { .. }));
        assert_eq!(err.to_string(), "unknown event `trello_card_close`");

        let err = registry
            .resolve(&Event::new("date", ["2015-01-01", "2016-01-01"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`date` expects exactly 1 argument(s), got 2"
        );
    }

    #[test]
    fn test_register_fn_replaces_entry() {
        let mut registry = Registry::new();
        registry
            .register_fn("always", Arity::Exactly(0), |_, _| {
                Ok(CheckOutcome::Met("always".to_string()))
            })
            .alias("forever", "always");

        assert_eq!(registry.names(), vec!["always", "forever"]);
        assert!(registry.resolve(&Event::new("forever", Vec::<i64>::new())).is_ok());
    }
}
