use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Error getting version of {package}: {message}")]
    Registry { package: String, message: String },
}

/// A version string that is not exactly `MAJOR.MINOR.PATCH`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected semver: {0}")]
pub struct FormatError(pub String);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger document {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No version info for {0}")]
    MissingVersionInfo(String),

    #[error("Expected to find a package named {0}")]
    UnknownPackage(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Package {0} is listed as both active and retired")]
    Overlap(String),

    #[error("Package {0} is listed more than once")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Package {package} has been deprecated upstream but is still tracked as active")]
    Integrity { package: String },

    #[error("Failed to fetch {package}: {source}")]
    Transport {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error("Registry reported a malformed version for {package}: {source}")]
    Format {
        package: String,
        #[source]
        source: FormatError,
    },

    #[error("Version of {package} cannot be bumped past {version}")]
    VersionOverflow { package: String, version: u64 },
}

/// Failure of a full load, synchronize and save cycle
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
