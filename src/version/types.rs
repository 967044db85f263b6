//! Ledger data types shared by the store, the registry and the synchronizer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::error::{FormatError, StoreError};
use crate::version::semver::version_number_from_semver;

/// Last known state of a single package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Patch counter of the version to publish next
    pub version: u64,
    pub content_hash: String,
    pub deprecated: bool,
}

/// Mapping from package name to its [`VersionRecord`]
///
/// Backed by a `BTreeMap` so the rendered document is key-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<String, VersionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package_name: &str) -> Option<&VersionRecord> {
        self.records.get(package_name)
    }

    /// Like [`Ledger::get`], but a missing package is an error
    pub fn version_info(&self, package_name: &str) -> Result<&VersionRecord, StoreError> {
        self.get(package_name)
            .ok_or_else(|| StoreError::MissingVersionInfo(package_name.to_string()))
    }

    /// Replace the record for a package wholesale
    pub fn insert(&mut self, package_name: String, record: VersionRecord) {
        self.records.insert(package_name, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionRecord)> {
        self.records.iter()
    }
}

impl FromIterator<(String, VersionRecord)> for Ledger {
    fn from_iter<T: IntoIterator<Item = (String, VersionRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Metadata of the latest published version, as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVersionInfo {
    /// Raw `dist-tags.latest` value
    pub latest_version: String,
    pub content_hash: String,
    pub deprecated: bool,
}

/// Remote state with the version already reduced to its patch counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteState {
    pub version: u64,
    pub content_hash: String,
    pub deprecated: bool,
}

impl RemoteState {
    /// Observation for a package that has never been published
    pub fn not_found() -> Self {
        Self {
            version: 0,
            content_hash: String::new(),
            deprecated: false,
        }
    }
}

impl TryFrom<RemoteVersionInfo> for RemoteState {
    type Error = FormatError;

    fn try_from(info: RemoteVersionInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            version: version_number_from_semver(&info.latest_version)?,
            content_hash: info.content_hash,
            deprecated: info.deprecated,
        })
    }
}
