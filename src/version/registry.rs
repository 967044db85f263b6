//! Registry trait for fetching published package metadata

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::RemoteVersionInfo;

/// Trait for fetching the latest published metadata of a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches metadata of the latest published version of a package
    ///
    /// # Arguments
    /// * `package_name` - The unscoped package name (e.g., "node" for "@types/node")
    ///
    /// # Returns
    /// * `Ok(RemoteVersionInfo)` - Version, content hash and deprecation flag of `latest`
    /// * `Err(RegistryError::NotFound)` - The package was never published
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_version_info(
        &self,
        package_name: &str,
    ) -> Result<RemoteVersionInfo, RegistryError>;
}
