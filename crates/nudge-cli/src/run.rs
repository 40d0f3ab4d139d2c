//! One pass over the codebase: scan, compile, evaluate, dispatch.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use nudge_checks::{EvaluationOutcome, Evaluator};
use nudge_core::{compile_block, emit_directive_fired, Directive, Scanner};
use nudge_notify::{Dispatcher, Reminder};

use crate::discovery::discover_files;

/// Counters and accumulated error lines of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub files_scanned: usize,
    pub directives: usize,
    pub parse_errors: usize,
    pub evaluation_errors: usize,
    pub fired: usize,
    pub deliveries_succeeded: usize,
    pub deliveries_failed: usize,
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// `0` for a clean run, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }
}

pub struct Runner {
    scanner: Scanner,
    evaluator: Evaluator,
    dispatcher: Dispatcher,
    extensions: Vec<String>,
}

impl Runner {
    pub fn new(scanner: Scanner, evaluator: Evaluator, dispatcher: Dispatcher) -> Self {
        Self {
            scanner,
            evaluator,
            dispatcher,
            extensions: vec!["rb".to_string()],
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Run the whole pipeline over `paths`.
    ///
    /// `progress` receives one `.` per scanned file. Problems with individual
    /// paths, files, directives or deliveries are collected in the report;
    /// only a failure to write progress is returned as `Err`.
    #[instrument(skip_all, fields(paths = paths.len()))]
    pub async fn run<W: Write>(&self, paths: &[PathBuf], progress: &mut W) -> Result<RunReport> {
        let mut report = RunReport::default();

        let discovery = discover_files(paths, &self.extensions);
        report.errors.extend(discovery.errors);
        let mut directives = Vec::new();
        for file in &discovery.files {
            match self.scan_file(file) {
                Ok(found) => directives.extend(found),
                Err(e) => report.errors.push(format!("{e:#}")),
            }
            report.files_scanned += 1;
            write!(progress, ".")?;
            progress.flush()?;
        }
        writeln!(progress)?;

        report.directives = directives.len();
        let evaluable = self.select(directives, &mut report);
        info!(
            files = report.files_scanned,
            directives = report.directives,
            evaluable = evaluable.len(),
            "scan finished"
        );

        let evaluations = self.evaluator.evaluate_all(&evaluable).await;

        let mut reminders = Vec::new();
        for (directive, evaluation) in evaluable.iter().zip(evaluations) {
            if let EvaluationOutcome::EvaluationError(message) = &evaluation.outcome {
                report.evaluation_errors += 1;
                report
                    .errors
                    .push(format!("Error while evaluating {}: {}", directive.location, message));
                continue;
            }

            let Some(message) = evaluation.outcome.message() else {
                continue;
            };
            report.fired += 1;
            emit_directive_fired(
                &directive.location.file,
                directive.location.start_line,
                directive
                    .primary_event()
                    .map(|e| e.method_name.as_str())
                    .unwrap_or("-"),
                directive.assignees.len(),
            );

            if directive.assignees.is_empty() {
                report.errors.push(format!(
                    "{}: the TODO is ready to be addressed but has nobody to notify; add a `to:` assignee",
                    directive.location
                ));
                continue;
            }
            reminders.push(Reminder::from_directive(
                directive,
                message,
                evaluation.references.clone(),
            ));
        }

        for delivery in self.dispatcher.dispatch(reminders).await {
            match delivery.error {
                None => report.deliveries_succeeded += 1,
                Some(error) => {
                    report.deliveries_failed += 1;
                    report.errors.push(format!("{}: {}", delivery.file, error));
                }
            }
        }

        Ok(report)
    }

    fn scan_file(&self, file: &Path) -> Result<Vec<Directive>> {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Error reading {}", file.display()))?;
        let file_name = file.display().to_string();

        let directives: Vec<Directive> = self
            .scanner
            .scan_source(&source)
            .with_context(|| format!("Error parsing {}", file.display()))?
            .iter()
            .map(|block| compile_block(block, &file_name))
            .collect();
        debug!(file = %file_name, directives = directives.len(), "scanned");
        Ok(directives)
    }

    /// Keep the directives that can be evaluated, reporting the others.
    fn select(&self, directives: Vec<Directive>, report: &mut RunReport) -> Vec<Directive> {
        let mut evaluable = Vec::new();
        for directive in directives {
            if !directive.parse_errors.is_empty() {
                report.parse_errors += 1;
                for error in &directive.parse_errors {
                    warn!(location = %directive.location, error = %error, "invalid directive");
                    report
                        .errors
                        .push(format!("Error while parsing {}: {}", directive.location, error));
                }
            } else if directive.events.is_empty() {
                debug!(location = %directive.location, "directive without events");
            } else if !directive.is_valid() {
                report.parse_errors += 1;
                report.errors.push(format!(
                    "Error while parsing {}: no assignee given, add at least one `to:`",
                    directive.location
                ));
            } else {
                evaluable.push(directive);
            }
        }
        evaluable
    }
}
