//! Locked dependency versions read from a `Cargo.lock`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use nudge_core::Version;

use crate::error::{CheckError, Result};

#[derive(Debug, Deserialize)]
struct LockFile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Package name to locked versions, in lockfile order.
#[derive(Debug, Clone, Default)]
pub struct LockedDependencies {
    packages: HashMap<String, Vec<Version>>,
}

impl LockedDependencies {
    pub fn parse(content: &str) -> Result<Self> {
        let lock: LockFile =
            toml::from_str(content).map_err(|e| CheckError::Lockfile(e.to_string()))?;

        let mut packages: HashMap<String, Vec<Version>> = HashMap::new();
        for pkg in lock.package {
            match Version::parse(&pkg.version) {
                Ok(version) => packages.entry(pkg.name).or_default().push(version),
                Err(e) => debug!(package = %pkg.name, error = %e, "skipping unparsable locked version"),
            }
        }

        Ok(Self { packages })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CheckError::Lockfile(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// First locked version of `name`.
    pub fn version_of(&self, name: &str) -> Option<&Version> {
        self.packages.get(name).and_then(|versions| versions.first())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
