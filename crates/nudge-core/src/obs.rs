//! Structured lifecycle events for a `nudge` run.
//!
//! Every run is wrapped in a [`run_span`]; the `emit_*` helpers log one
//! `info!` line per lifecycle step with an `event` field that log pipelines
//! can filter on.

use tracing::{info, warn, Span};

/// Span that scopes one run; every event recorded inside carries `run_id`.
///
/// ```ignore
/// async { /* every log line carries run_id */ }
///     .instrument(run_span(&run_id))
///     .await
/// ```
pub fn run_span(run_id: &str) -> Span {
    tracing::info_span!("nudge.run", run_id = %run_id)
}

/// Emit event: run started over `paths`.
pub fn emit_run_started(run_id: &str, paths: &[String], dispatcher: &str) {
    info!(
        event = "run.started",
        run_id = %run_id,
        paths = %paths.join(","),
        dispatcher = %dispatcher,
    );
}

/// Emit event: a directive's condition holds and it will be dispatched.
pub fn emit_directive_fired(file: &str, line: Option<usize>, event_name: &str, assignees: usize) {
    info!(
        event = "directive.fired",
        file = %file,
        line = line,
        trigger = %event_name,
        assignees = assignees,
    );
}

/// Emit event: one delivery unit finished, successfully or not.
pub fn emit_delivery_finished(assignee: &str, recipient: &str, attempts: u32, error: Option<&str>) {
    match error {
        None => info!(
            event = "delivery.finished",
            assignee = %assignee,
            recipient = %recipient,
            attempts = attempts,
            success = true,
        ),
        Some(error) => warn!(
            event = "delivery.finished",
            assignee = %assignee,
            recipient = %recipient,
            attempts = attempts,
            success = false,
            error = %error,
        ),
    }
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, fired: usize, errors: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        fired = fired,
        errors = errors,
        success = errors == 0,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        run_span("test-run-id").in_scope(|| {
            emit_run_started("test-run-id", &[".".to_string()], "output");
            emit_directive_fired("a.rb", Some(3), "date", 1);
            emit_delivery_finished("a@b.co", "U123", 1, None);
            emit_delivery_finished("a@b.co", "U123", 5, Some("ratelimited"));
            emit_run_finished("test-run-id", 12, 1, 1);
        });
    }
}
