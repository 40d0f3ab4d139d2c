//! In-memory fakes for the network seams (testing only)
//!
//! [`MemoryPackageIndex`] and [`MemoryIssueTracker`] satisfy the trait
//! contracts without any network access and record the lookups they served.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::issue_tracker::{Issue, IssueKind, IssueTracker};
use crate::package_index::PackageIndex;

// ---------------------------------------------------------------------------
// MemoryPackageIndex
// ---------------------------------------------------------------------------

/// Package index backed by a `HashMap<name, versions>`; unknown names behave
/// like a registry 404.
#[derive(Debug, Default)]
pub struct MemoryPackageIndex {
    packages: Mutex<HashMap<String, Vec<String>>>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryPackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package<I, S>(self, name: &str, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages
            .lock()
            .unwrap()
            .insert(name.to_string(), versions.into_iter().map(Into::into).collect());
        self
    }

    /// Names looked up so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageIndex for MemoryPackageIndex {
    async fn versions(&self, name: &str) -> Result<Option<Vec<String>>> {
        self.lookups.lock().unwrap().push(name.to_string());
        Ok(self.packages.lock().unwrap().get(name).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryIssueTracker
// ---------------------------------------------------------------------------

type IssueKey = (IssueKind, String, String, String);

/// Issue tracker backed by a `HashMap`; unknown issues behave like a 404.
#[derive(Debug, Default)]
pub struct MemoryIssueTracker {
    issues: Mutex<HashMap<IssueKey, Issue>>,
    lookups: Mutex<Vec<IssueKey>>,
}

impl MemoryIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(self, kind: IssueKind, org: &str, repo: &str, number: u64, issue: Issue) -> Self {
        self.issues.lock().unwrap().insert(
            (kind, org.to_string(), repo.to_string(), number.to_string()),
            issue,
        );
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl IssueTracker for MemoryIssueTracker {
    async fn fetch(
        &self,
        kind: IssueKind,
        org: &str,
        repo: &str,
        number: &str,
    ) -> Result<Option<Issue>> {
        let key = (kind, org.to_string(), repo.to_string(), number.to_string());
        self.lookups.lock().unwrap().push(key.clone());
        Ok(self.issues.lock().unwrap().get(&key).cloned())
    }
}
