//! Everything a check may consult while it runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

use nudge_core::Version;

use crate::issue_tracker::IssueTracker;
use crate::lockfile::LockedDependencies;
use crate::package_index::PackageIndex;

/// Shared, read-only inputs of one evaluation pass.
#[derive(Clone)]
pub struct CheckContext {
    /// Reference instant for date checks, fixed for the whole run.
    pub now: DateTime<Utc>,
    pub packages: Arc<dyn PackageIndex>,
    pub issues: Arc<dyn IssueTracker>,
    pub lockfile: Option<Arc<LockedDependencies>>,
    /// Host runtime version: configured up front, or detected on first use.
    runtime_version: Arc<OnceCell<Option<Version>>>,
}

impl CheckContext {
    pub fn new(packages: Arc<dyn PackageIndex>, issues: Arc<dyn IssueTracker>) -> Self {
        Self {
            now: Utc::now(),
            packages,
            issues,
            lockfile: None,
            runtime_version: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_lockfile(mut self, lockfile: LockedDependencies) -> Self {
        self.lockfile = Some(Arc::new(lockfile));
        self
    }

    pub fn with_runtime_version(mut self, version: Version) -> Self {
        self.runtime_version = Arc::new(OnceCell::new_with(Some(Some(version))));
        self
    }

    /// The configured runtime version, else the one reported by the
    /// installed interpreter. `None` only when neither is available.
    pub async fn runtime_version(&self) -> Option<&Version> {
        self.runtime_version
            .get_or_init(detect_runtime_version)
            .await
            .as_ref()
    }
}

/// Ask the installed `ruby` for its version.
pub async fn detect_runtime_version() -> Option<Version> {
    let output = match Command::new("ruby")
        .args(["-e", "print RUBY_VERSION"])
        .output()
        .await
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            debug!(status = %output.status, "ruby exited unsuccessfully");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "no runtime to ask for its version");
            return None;
        }
    };

    let raw = String::from_utf8_lossy(&output.stdout);
    match Version::parse(raw.trim()) {
        Ok(version) => {
            debug!(version = %version, "detected runtime version");
            Some(version)
        }
        Err(e) => {
            debug!(error = %e, "unparseable runtime version");
            None
        }
    }
}

impl std::fmt::Debug for CheckContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckContext")
            .field("now", &self.now)
            .field("lockfile", &self.lockfile.as_ref().map(|l| l.len()))
            .field("runtime_version", &self.runtime_version.get())
            .finish_non_exhaustive()
    }
}
