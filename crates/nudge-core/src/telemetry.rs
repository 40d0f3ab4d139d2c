//! Tracing initialisation for the `nudge` binary.
//!
//! Log lines go to stderr; stdout is reserved for progress output and the
//! `output` dispatcher.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding nudge's own filter directives. Takes
/// precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "NUDGE_LOG";

/// Log targets of the nudge crates, binary included.
pub const NUDGE_TARGETS: [&str; 4] = ["nudge", "nudge_core", "nudge_checks", "nudge_notify"];

/// Filter used when neither [`LOG_ENV`] nor `RUST_LOG` is set.
///
/// The nudge crates log at `level`. Everything else (HTTP client, TLS) stays
/// at `warn` unless `level` is quieter still.
pub fn default_directives(level: Level) -> String {
    let ours = level.as_str().to_ascii_lowercase();
    let theirs = level.min(Level::WARN).as_str().to_ascii_lowercase();

    std::iter::once(theirs)
        .chain(NUDGE_TARGETS.iter().map(|target| format!("{target}={ours}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines.
/// * `level` — verbosity of the nudge crates when no filter is set in the
///   environment.
///
/// Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
