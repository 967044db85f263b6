//! Registry test utilities

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use version_ledger::catalog::{ActivePackage, RetiredPackage};
use version_ledger::sync::ChangeLogger;
use version_ledger::version::error::RegistryError;
use version_ledger::version::registry::MetadataFetcher;
use version_ledger::version::store::LedgerStore;
use version_ledger::version::types::{RemoteVersionInfo, VersionRecord};

/// Mock registry for testing
///
/// Packages not registered with [`MockRegistry::with_package`] are reported
/// as not found. Tracks how many fetches run concurrently.
#[derive(Default)]
pub struct MockRegistry {
    packages: HashMap<String, RemoteVersionInfo>,
    failures: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(
        mut self,
        package: &str,
        latest_version: &str,
        content_hash: &str,
        deprecated: bool,
    ) -> Self {
        self.packages.insert(
            package.to_string(),
            RemoteVersionInfo {
                latest_version: latest_version.to_string(),
                content_hash: content_hash.to_string(),
                deprecated,
            },
        );
        self
    }

    /// Make fetches of `package` fail with a transport error
    pub fn with_failure(mut self, package: &str) -> Self {
        self.failures.insert(package.to_string());
        self
    }

    /// Delay every fetch so that concurrent fetches overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for MockRegistry {
    async fn fetch_version_info(
        &self,
        package_name: &str,
    ) -> Result<RemoteVersionInfo, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(package_name) {
            return Err(RegistryError::InvalidResponse(
                "Unexpected status: 500 Internal Server Error".to_string(),
            ));
        }

        match self.packages.get(package_name) {
            Some(info) => Ok(info.clone()),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }
}

/// Collects change lines for assertions
#[derive(Default)]
pub struct CollectingLogger {
    lines: Mutex<Vec<String>>,
}

impl CollectingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ChangeLogger for CollectingLogger {
    fn log(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

pub fn active(name: &str, content_hash: &str) -> ActivePackage {
    ActivePackage {
        name: name.to_string(),
        content_hash: content_hash.to_string(),
    }
}

pub fn retired(name: &str) -> RetiredPackage {
    RetiredPackage {
        name: name.to_string(),
    }
}

pub fn record(version: u64, content_hash: &str, deprecated: bool) -> VersionRecord {
    VersionRecord {
        version,
        content_hash: content_hash.to_string(),
        deprecated,
    }
}

/// Create a ledger store inside a fresh temporary directory
pub fn create_test_store() -> (TempDir, LedgerStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::new(
        temp_dir.path().join("versions.json"),
        temp_dir.path().join("version-changes.txt"),
    );
    (temp_dir, store)
}
