//! Runs a directive's events against the registry.
//!
//! Events are evaluated in source order and the first one that holds wins.
//! After the first failure the remaining events are only resolved (name and
//! arity) so that every mistake in the comment is reported at once, but no
//! further check is invoked and the directive does not fire.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};

use nudge_core::{Directive, Event};

use crate::context::CheckContext;
use crate::registry::{CheckKind, CheckOutcome, Registry};

/// Verdict for one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// An event holds; message for the assignees.
    Satisfied(String),
    /// Nothing holds but a check could not tell; message for the assignees.
    Inconclusive(String),
    NotSatisfied,
    /// Lookup or evaluation failed; the directive is treated as not fired.
    EvaluationError(String),
}

impl EvaluationOutcome {
    /// Message to deliver, if the outcome warrants a notification.
    pub fn message(&self) -> Option<&str> {
        match self {
            EvaluationOutcome::Satisfied(m) | EvaluationOutcome::Inconclusive(m) => Some(m),
            EvaluationOutcome::NotSatisfied | EvaluationOutcome::EvaluationError(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvaluationOutcome::EvaluationError(_))
    }
}

/// Outcome plus the reference lines gathered for a directive that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub outcome: EvaluationOutcome,
    /// Context and pinned-issue descriptions, in directive order.
    pub references: Vec<String>,
}

impl Evaluation {
    pub fn should_notify(&self) -> bool {
        self.outcome.message().is_some()
    }
}

pub struct Evaluator {
    registry: Arc<Registry>,
    ctx: Arc<CheckContext>,
    concurrency: usize,
}

impl Evaluator {
    pub fn new(registry: Arc<Registry>, ctx: Arc<CheckContext>) -> Self {
        Self {
            registry,
            ctx,
            concurrency: 8,
        }
    }

    /// Maximum number of directives evaluated at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Evaluate the trigger events of `directive`.
    #[instrument(skip_all, fields(file = %directive.location.file, line = ?directive.location.start_line))]
    pub async fn evaluate(&self, directive: &Directive) -> EvaluationOutcome {
        let mut errors: Vec<String> = Vec::new();
        let mut inconclusive: Option<String> = None;

        for event in &directive.events {
            let entry = match self.registry.resolve(event) {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(format!("{}: {}", event.source, e));
                    continue;
                }
            };

            if !errors.is_empty() || entry.kind == CheckKind::Reference {
                continue;
            }

            match entry.check().evaluate(&self.ctx, &event.arguments).await {
                Ok(CheckOutcome::Met(message)) => {
                    debug!(event = %event.method_name, "event met");
                    return EvaluationOutcome::Satisfied(message);
                }
                Ok(CheckOutcome::Unmet) => {}
                Ok(CheckOutcome::Inconclusive(message)) => {
                    inconclusive.get_or_insert(message);
                }
                Err(e) => errors.push(format!("{}: {}", event.source, e)),
            }
        }

        if !errors.is_empty() {
            return EvaluationOutcome::EvaluationError(errors.join("; "));
        }
        match inconclusive {
            Some(message) => EvaluationOutcome::Inconclusive(message),
            None => EvaluationOutcome::NotSatisfied,
        }
    }

    /// Evaluate `directive` and, when it fires, collect its reference lines.
    pub async fn evaluate_directive(&self, directive: &Directive) -> Evaluation {
        let outcome = self.evaluate(directive).await;
        let references = if outcome.message().is_some() {
            self.describe_references(directive).await
        } else {
            Vec::new()
        };
        Evaluation {
            outcome,
            references,
        }
    }

    /// Evaluate every directive with bounded concurrency, preserving order.
    pub async fn evaluate_all(&self, directives: &[Directive]) -> Vec<Evaluation> {
        stream::iter(directives)
            .map(|d| self.evaluate_directive(d))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Descriptions for the `context:` event and any reference events.
    ///
    /// Lookup failures drop the line instead of failing the directive.
    pub async fn describe_references(&self, directive: &Directive) -> Vec<String> {
        let events = directive.context.iter().chain(
            directive
                .events
                .iter()
                .filter(|e| self.kind_of(e) == Some(CheckKind::Reference)),
        );

        let mut lines = Vec::new();
        for event in events {
            if let Some(line) = self.describe(event).await {
                lines.push(line);
            }
        }
        lines
    }

    fn kind_of(&self, event: &Event) -> Option<CheckKind> {
        self.registry.get(&event.method_name).map(|e| e.kind)
    }

    async fn describe(&self, event: &Event) -> Option<String> {
        let entry = match self.registry.resolve(event) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(event = %event.source, error = %e, "skipping reference");
                return None;
            }
        };

        match entry.check().evaluate(&self.ctx, &event.arguments).await {
            Ok(CheckOutcome::Met(line)) | Ok(CheckOutcome::Inconclusive(line)) => Some(line),
            Ok(CheckOutcome::Unmet) => None,
            Err(e) => {
                warn!(event = %event.source, error = %e, "reference lookup failed");
                None
            }
        }
    }
}
