//! Package catalog: the packages a synchronization run covers

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::version::error::CatalogError;

/// A package that is still published from local sources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePackage {
    pub name: String,
    /// Fingerprint of the local content
    pub content_hash: String,
}

/// A package that is no longer needed and should end up deprecated
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetiredPackage {
    pub name: String,
}

/// Borrowed view of either kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry<'a> {
    Active(&'a ActivePackage),
    Retired(&'a RetiredPackage),
}

impl CatalogEntry<'_> {
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Active(pkg) => &pkg.name,
            CatalogEntry::Retired(pkg) => &pkg.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    active: Vec<ActivePackage>,
    retired: Vec<RetiredPackage>,
}

/// Two disjoint package sets: active and retired
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    active: Vec<ActivePackage>,
    retired: Vec<RetiredPackage>,
}

impl Catalog {
    pub fn new(
        active: Vec<ActivePackage>,
        retired: Vec<RetiredPackage>,
    ) -> Result<Self, CatalogError> {
        let mut active_names = HashSet::new();
        for pkg in &active {
            if !active_names.insert(pkg.name.as_str()) {
                return Err(CatalogError::Duplicate(pkg.name.clone()));
            }
        }

        let mut retired_names = HashSet::new();
        for pkg in &retired {
            if active_names.contains(pkg.name.as_str()) {
                return Err(CatalogError::Overlap(pkg.name.clone()));
            }
            if !retired_names.insert(pkg.name.as_str()) {
                return Err(CatalogError::Duplicate(pkg.name.clone()));
            }
        }

        Ok(Self { active, retired })
    }

    /// Load a catalog from a JSON document of the form
    /// `{"active": [{"name", "contentHash"}], "retired": [{"name"}]}`
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawCatalog =
            serde_json::from_str(&content).map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "Loaded catalog with {} active and {} retired packages",
            raw.active.len(),
            raw.retired.len()
        );

        Self::new(raw.active, raw.retired)
    }

    pub fn active(&self) -> &[ActivePackage] {
        &self.active
    }

    pub fn retired(&self) -> &[RetiredPackage] {
        &self.retired
    }

    /// Find a package by name in either set
    pub fn find(&self, name: &str) -> Option<CatalogEntry<'_>> {
        self.active
            .iter()
            .find(|p| p.name == name)
            .map(CatalogEntry::Active)
            .or_else(|| {
                self.retired
                    .iter()
                    .find(|p| p.name == name)
                    .map(CatalogEntry::Retired)
            })
    }
}
