//! npm registry API implementation

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::version::error::RegistryError;
use crate::version::registry::MetadataFetcher;
use crate::version::types::RemoteVersionInfo;

/// Error message the registry returns for unpublished packages
const NOT_FOUND_MESSAGE: &str = "Not found";

/// Response from npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    error: Option<String>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, NpmVersionMeta>,
}

/// Per-version metadata written by the publisher
#[derive(Debug, Deserialize)]
struct NpmVersionMeta {
    #[serde(rename = "typesPublisherContentHash")]
    content_hash: Option<String>,
    /// npm stores the deprecation message here; any truthy value counts
    #[serde(default)]
    deprecated: serde_json::Value,
}

/// Registry implementation for npm registry API
#[derive(Clone)]
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
    scope: Option<String>,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL and package scope
    pub fn new(
        base_url: &str,
        scope: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent("version-ledger")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            scope: scope.map(str::to_string),
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, RegistryError> {
        Self::new(
            &config.registry_url,
            config.scope.as_deref(),
            Duration::from_millis(config.fetch_timeout_ms),
        )
    }

    /// Full published name, e.g. "node" -> "@types/node"
    pub fn full_package_name(&self, package_name: &str) -> String {
        match &self.scope {
            Some(scope) => format!("@{}/{}", scope, package_name),
            None => package_name.to_string(),
        }
    }

    /// Encode package name for URL (the scope separator must not split the path)
    fn encode_package_name(full_name: &str) -> String {
        full_name.replace('/', "%2f")
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for NpmRegistry {
    async fn fetch_version_info(
        &self,
        package_name: &str,
    ) -> Result<RemoteVersionInfo, RegistryError> {
        let encoded_name = Self::encode_package_name(&self.full_package_name(package_name));
        let url = format!("{}/{}", self.base_url, encoded_name);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        if let Some(message) = package_info.error {
            if message == NOT_FOUND_MESSAGE {
                return Err(RegistryError::NotFound(package_name.to_string()));
            }
            return Err(RegistryError::Registry {
                package: package_name.to_string(),
                message,
            });
        }

        let Some(latest) = package_info.dist_tags.get("latest") else {
            return Err(RegistryError::InvalidResponse(format!(
                "{} has no latest dist-tag",
                package_name
            )));
        };

        let Some(latest_meta) = package_info.versions.get(latest) else {
            return Err(RegistryError::InvalidResponse(format!(
                "{} has no metadata for latest version {}",
                package_name, latest
            )));
        };

        Ok(RemoteVersionInfo {
            latest_version: latest.clone(),
            content_hash: latest_meta.content_hash.clone().unwrap_or_default(),
            deprecated: is_truthy(&latest_meta.deprecated),
        })
    }
}
