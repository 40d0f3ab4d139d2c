//! Links from a reminder back to the source line on the code host.
//!
//! Only available when the run happens inside a CI job that exposes the
//! repository URL and commit (GitHub Actions, Buildkite). The configuration
//! is read once at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File names that stand for inline or stdin input.
const UNLINKABLE_PATHS: [&str; 2] = ["-e", "-"];

/// A clickable file reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub url: String,
    pub display: String,
}

impl DeepLink {
    /// Slack `<url|text>` markup.
    pub fn markup(&self) -> String {
        format!("<{}|{}>", self.url, self.display)
    }
}

/// Repository URL, commit and path prefix of the current CI checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLinkConfig {
    /// `https://github.com/org/repo`, no trailing slash or `.git`
    pub repo_url: String,
    pub commit: String,
    /// Path from the repository root to the scan's working directory.
    pub prefix: String,
}

impl DeepLinkConfig {
    /// Detect the CI environment of the current process.
    pub fn from_env() -> Option<Self> {
        let cwd = std::env::current_dir().ok()?;
        Self::detect(|key| std::env::var(key).ok(), &cwd)
    }

    /// Detect from an arbitrary variable lookup; `cwd` is the directory the
    /// scanned paths are relative to.
    pub fn detect<F>(var: F, cwd: &Path) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix_from = |checkout: Option<String>| {
            var("NUDGE_REPO_PATH").unwrap_or_else(|| {
                checkout
                    .and_then(|root| {
                        cwd.strip_prefix(&root)
                            .ok()
                            .map(|p| p.to_string_lossy().to_string())
                    })
                    .unwrap_or_default()
            })
        };

        if var("GITHUB_ACTIONS").is_some() {
            let server = var("GITHUB_SERVER_URL")?;
            let repository = var("GITHUB_REPOSITORY")?;
            return Some(Self {
                repo_url: format!("{}/{}", server.trim_end_matches('/'), repository),
                commit: var("GITHUB_SHA")?,
                prefix: prefix_from(var("GITHUB_WORKSPACE")),
            });
        }

        if var("BUILDKITE").is_some() {
            let repo = var("BUILDKITE_REPO")?;
            return Some(Self {
                repo_url: repo.trim_end_matches(".git").to_string(),
                commit: var("BUILDKITE_COMMIT")?,
                prefix: prefix_from(var("BUILDKITE_BUILD_CHECKOUT_PATH")),
            });
        }

        None
    }

    /// Link to `file` at `start..=end`, or `None` for unlinkable paths.
    pub fn link(&self, file: &str, start: Option<usize>, end: Option<usize>) -> Option<DeepLink> {
        if UNLINKABLE_PATHS.contains(&file) {
            return None;
        }

        let file = file.strip_prefix("./").unwrap_or(file);
        let path = if self.prefix.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), file)
        };

        let (fragment, line_ref) = match (start, end) {
            (Some(s), Some(e)) if e != s => (format!("#L{s}-L{e}"), format!(":{s}-{e}")),
            (Some(s), _) => (format!("#L{s}"), format!(":{s}")),
            (None, _) => (String::new(), String::new()),
        };

        Some(DeepLink {
            url: format!("{}/blob/{}/{}{}", self.repo_url, self.commit, path, fragment),
            display: format!("{path}{line_ref}"),
        })
    }
}
