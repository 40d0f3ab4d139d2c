//! Package registry client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::NudgeConfig;
use crate::error::Result;
use crate::http::{build_client, get_json, Fetched};

/// Source of published package versions.
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Every published version number of `name`, or `None` when the registry
    /// answers with a client error (unknown package, private package, ...).
    async fn versions(&self, name: &str) -> Result<Option<Vec<String>>>;
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    number: String,
}

/// `GET {base}/api/v1/versions/{name}.json`
pub struct RegistryClient {
    base_url: String,
    http_client: Client,
}

impl RegistryClient {
    pub fn new(config: &NudgeConfig) -> Result<Self> {
        Ok(RegistryClient {
            base_url: config.package_registry_url.trim_end_matches('/').to_string(),
            http_client: build_client(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PackageIndex for RegistryClient {
    async fn versions(&self, name: &str) -> Result<Option<Vec<String>>> {
        let url = format!("{}/api/v1/versions/{}.json", self.base_url, name);
        let request = self.http_client.get(&url);

        match get_json::<Vec<VersionEntry>>(request, &url).await? {
            Fetched::Found(entries) => Ok(Some(entries.into_iter().map(|e| e.number).collect())),
            Fetched::ClientError(_) => Ok(None),
        }
    }
}
