//! File-backed persistence for the ledger and the change list

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::SyncConfig;
use crate::version::error::StoreError;
use crate::version::types::Ledger;

/// Reads and writes the ledger document and the change list
#[derive(Debug, Clone)]
pub struct LedgerStore {
    versions_path: PathBuf,
    changes_path: PathBuf,
}

impl LedgerStore {
    pub fn new(versions_path: impl Into<PathBuf>, changes_path: impl Into<PathBuf>) -> Self {
        Self {
            versions_path: versions_path.into(),
            changes_path: changes_path.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.versions_path, &config.changes_path)
    }

    pub fn versions_path(&self) -> &Path {
        &self.versions_path
    }

    /// Whether a ledger document has been written before
    pub fn exists(&self) -> bool {
        self.versions_path.exists()
    }

    /// Load the ledger. Fails if the document is absent or malformed.
    pub fn load(&self) -> Result<Ledger, StoreError> {
        let content = read_file(&self.versions_path)?;

        let ledger: Ledger =
            serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: self.versions_path.clone(),
                source,
            })?;

        debug!(
            "Loaded {} ledger records from {:?}",
            ledger.len(),
            self.versions_path
        );
        Ok(ledger)
    }

    pub fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let content = render(ledger).map_err(|source| StoreError::Json {
            path: self.versions_path.clone(),
            source,
        })?;

        write_file_atomic(&self.versions_path, content.as_bytes())?;
        info!(
            "Saved {} ledger records to {:?}",
            ledger.len(),
            self.versions_path
        );
        Ok(())
    }

    pub fn load_changes(&self) -> Result<Vec<String>, StoreError> {
        let content = read_file(&self.changes_path)?;
        Ok(content.split('\n').map(str::to_string).collect())
    }

    pub fn save_changes(&self, changes: &[String]) -> Result<(), StoreError> {
        write_file_atomic(&self.changes_path, changes.join("\n").as_bytes())?;
        info!("Saved {} changes to {:?}", changes.len(), self.changes_path);
        Ok(())
    }
}

/// Resolve the names in the stored change list to their catalog entries
///
/// Blank lines are skipped; an empty change list is stored as an empty file.
pub fn changed_packages<'a>(
    store: &LedgerStore,
    catalog: &'a Catalog,
) -> Result<Vec<CatalogEntry<'a>>, StoreError> {
    store
        .load_changes()?
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| {
            catalog
                .find(name)
                .ok_or_else(|| StoreError::UnknownPackage(name.clone()))
        })
        .collect()
}

/// Render the ledger as JSON indented by four spaces
fn render(ledger: &Ledger) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    ledger.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a temporary file in the target directory, then rename over the target
///
/// The temporary file is removed if any step fails.
fn write_file_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io_err)?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
    temp_file.write_all(content).map_err(io_err)?;
    temp_file.as_file().sync_all().map_err(io_err)?;

    temp_file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
