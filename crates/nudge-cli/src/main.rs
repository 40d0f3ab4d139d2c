//! nudge - conditional reminders embedded in code comments
//!
//! Scans source files for tagged comments such as
//! `# TODO(on: date('2025-01-01'), to: 'dev@example.com')`, evaluates their
//! conditions and notifies the assignees of those that hold.
//!
//! Prints one `.` per scanned file, then every problem found on stderr. The
//! exit status is `1` when any directive could not be parsed or evaluated or
//! any delivery failed.

mod discovery;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, Instrument, Level};

use nudge_checks::{
    CheckContext, Evaluator, GitHubClient, LockedDependencies, NudgeConfig, Registry,
    RegistryClient, TokenSet,
};
use nudge_core::{
    emit_run_finished, emit_run_started, init_tracing, run_span, Scanner, ScannerConfig, Version,
};
use nudge_notify::{
    DeepLinkConfig, DispatchConfig, Dispatcher, OutputTransport, RetryPolicy, SlackConfig,
    SlackTransport, Transport,
};

use crate::run::{RunReport, Runner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DispatcherKind {
    /// Post to Slack
    Slack,
    /// Print messages to stdout
    Output,
}

impl DispatcherKind {
    fn as_str(self) -> &'static str {
        match self {
            DispatcherKind::Slack => "slack",
            DispatcherKind::Output => "output",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "nudge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn TODO comments into reminders that fire when their condition holds", long_about = None)]
struct Cli {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Slack bot token
    #[arg(long, env = "NUDGE_SLACK_TOKEN", hide_env_values = true)]
    slack_token: Option<String>,

    /// Channel that receives reminders whose assignee cannot be reached
    #[arg(long, env = "NUDGE_FALLBACK_CHANNEL")]
    fallback_channel: Option<String>,

    /// Where reminders are delivered
    #[arg(long, value_enum, default_value_t = DispatcherKind::Slack)]
    dispatcher: DispatcherKind,

    /// Comment tag to look for (repeatable)
    #[arg(long = "tag", default_values = ["TODO", "FIXME", "OPTIMIZE"])]
    tags: Vec<String>,

    /// File extension to scan inside directories (repeatable)
    #[arg(long = "extension", default_values = ["rb"])]
    extensions: Vec<String>,

    /// Lockfile consulted by `package_bump`; read when present
    #[arg(long, default_value = "Cargo.lock")]
    lockfile: PathBuf,

    /// Runtime version checked by `runtime_version` (default: ask the installed `ruby`)
    #[arg(long, env = "NUDGE_RUNTIME_VERSION")]
    runtime_version: Option<String>,

    /// Number of delivery workers (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Minimum wait in seconds after a rate-limited request
    #[arg(long, default_value = "30")]
    rate_limit_min_delay: u64,

    /// Maximum wait in seconds after a rate-limited request
    #[arg(long, default_value = "600")]
    rate_limit_max_delay: u64,

    /// Attempts per request when rate limited
    #[arg(long, default_value = "5")]
    max_attempts: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    let run_id = uuid::Uuid::new_v4().to_string();
    let report = execute(&cli, &run_id).instrument(run_span(&run_id)).await?;
    Ok(ExitCode::from(report.exit_code()))
}

async fn execute(cli: &Cli, run_id: &str) -> Result<RunReport> {
    let paths: Vec<String> = cli.paths.iter().map(|p| p.display().to_string()).collect();
    emit_run_started(run_id, &paths, cli.dispatcher.as_str());

    let runner = build_runner(cli)?;
    let started = Instant::now();
    let mut stdout = std::io::stdout();

    let report = match cli.timeout {
        Some(secs) => tokio::time::timeout(
            Duration::from_secs(secs),
            runner.run(&cli.paths, &mut stdout),
        )
        .await
        .with_context(|| format!("run did not finish within {secs}s"))??,
        None => runner.run(&cli.paths, &mut stdout).await?,
    };

    print_errors(&report);
    emit_run_finished(
        run_id,
        started.elapsed().as_millis() as u64,
        report.fired,
        report.errors.len(),
    );
    Ok(report)
}

fn print_errors(report: &RunReport) {
    for error in &report.errors {
        eprintln!("{error}");
    }
}

fn build_runner(cli: &Cli) -> Result<Runner> {
    let transport = build_transport(cli)?;

    let config = NudgeConfig::from_env();
    let packages = RegistryClient::new(&config).context("Failed to build registry client")?;
    let issues = GitHubClient::new(&config, TokenSet::from_env())
        .context("Failed to build issue tracker client")?;

    let mut ctx = CheckContext::new(Arc::new(packages), Arc::new(issues));
    if cli.lockfile.is_file() {
        let locked = LockedDependencies::load(&cli.lockfile)
            .with_context(|| format!("Failed to read {}", cli.lockfile.display()))?;
        ctx = ctx.with_lockfile(locked);
    } else {
        debug!(path = %cli.lockfile.display(), "no lockfile");
    }
    if let Some(version) = &cli.runtime_version {
        let version = Version::parse(version)
            .with_context(|| format!("Invalid --runtime-version {version:?}"))?;
        ctx = ctx.with_runtime_version(version);
    }
    let evaluator = Evaluator::new(Arc::new(Registry::with_builtins()), Arc::new(ctx));

    let mut dispatch = DispatchConfig::default()
        .with_retry(RetryPolicy {
            max_attempts: cli.max_attempts.max(1),
            min_delay: Duration::from_secs(cli.rate_limit_min_delay),
            max_delay: Duration::from_secs(cli.rate_limit_max_delay),
        })
        .with_deep_link(DeepLinkConfig::from_env());
    if let Some(workers) = cli.workers {
        dispatch = dispatch.with_workers(workers);
    }
    if let Some(channel) = &cli.fallback_channel {
        dispatch = dispatch.with_fallback_channel(channel);
    }

    let scanner = Scanner::new(ScannerConfig::default().with_tags(cli.tags.iter()));
    Ok(Runner::new(scanner, evaluator, Dispatcher::new(transport, dispatch))
        .with_extensions(cli.extensions.clone()))
}

/// Build the transport, checking its settings before any file is scanned.
fn build_transport(cli: &Cli) -> Result<Arc<dyn Transport>> {
    match cli.dispatcher {
        DispatcherKind::Output => Ok(Arc::new(OutputTransport::stdout())),
        DispatcherKind::Slack => {
            let Some(token) = cli.slack_token.as_deref().filter(|t| !t.is_empty()) else {
                bail!("Missing Slack token: pass --slack-token or set NUDGE_SLACK_TOKEN");
            };
            if cli.fallback_channel.as_deref().map_or(true, str::is_empty) {
                bail!("Missing fallback channel: pass --fallback-channel or set NUDGE_FALLBACK_CHANNEL");
            }
            let transport = SlackTransport::new(&SlackConfig::from_env().with_token(token))
                .context("Failed to build Slack client")?;
            Ok(Arc::new(transport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nudge").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.paths, vec![PathBuf::from(".")]);
        assert_eq!(cli.tags, vec!["TODO", "FIXME", "OPTIMIZE"]);
        assert_eq!(cli.extensions, vec!["rb"]);
        assert_eq!(cli.dispatcher, DispatcherKind::Slack);
        assert_eq!(cli.max_attempts, 5);
        assert_eq!(cli.rate_limit_min_delay, 30);
        assert_eq!(cli.rate_limit_max_delay, 600);
    }

    #[test]
    fn test_repeated_options_replace_defaults() {
        let cli = parse(&[
            "--tag", "REMOVE", "--tag", "TODO", "--extension", "py", "--dispatcher", "output", "app", "lib",
        ]);
        assert_eq!(cli.tags, vec!["REMOVE", "TODO"]);
        assert_eq!(cli.extensions, vec!["py"]);
        assert_eq!(cli.dispatcher, DispatcherKind::Output);
        assert_eq!(cli.paths, vec![PathBuf::from("app"), PathBuf::from("lib")]);
    }

    #[test]
    fn test_slack_requires_token_and_fallback() {
        let mut cli = parse(&["--dispatcher", "slack"]);
        cli.slack_token = None;
        cli.fallback_channel = Some("#fallback".to_string());
        let err = build_transport(&cli).err().unwrap();
        assert!(err.to_string().contains("Slack token"), "{err}");

        cli.slack_token = Some("xoxb-1".to_string());
        cli.fallback_channel = None;
        let err = build_transport(&cli).err().unwrap();
        assert!(err.to_string().contains("fallback channel"), "{err}");

        cli.fallback_channel = Some("#fallback".to_string());
        let transport = build_transport(&cli).unwrap();
        assert_eq!(transport.name(), "slack");
    }

    #[test]
    fn test_output_dispatcher_needs_no_credentials() {
        let mut cli = parse(&["--dispatcher", "output"]);
        cli.slack_token = None;
        cli.fallback_channel = None;
        assert_eq!(build_transport(&cli).unwrap().name(), "output");
    }
}
