//! Reconcile a whole catalog against the registry

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::SyncConfig;
use crate::sync::logger::ChangeLogger;
use crate::version::error::{RegistryError, SyncError};
use crate::version::reconcile::{
    PackageClass, PreviousState, ReconcileError, Reconciled, reconcile,
};
use crate::version::registry::MetadataFetcher;
use crate::version::types::{Ledger, RemoteState};

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Changed packages in detection order
    pub changes: Vec<String>,
    pub ledger: Ledger,
}

/// One unit of fetch-and-decide work
struct PackageJob<'a> {
    name: &'a str,
    class: PackageClass,
    /// Local fingerprint, only known for active packages
    content_hash: Option<&'a str>,
}

/// Drives a reconciliation pass over a [`Catalog`]
///
/// At most `concurrency` fetches are in flight at any time. The first error
/// aborts the run: nothing further is scheduled and no partial result is
/// returned.
pub struct Synchronizer {
    fetcher: Arc<dyn MetadataFetcher>,
    concurrency: usize,
}

impl Synchronizer {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(fetcher: Arc<dyn MetadataFetcher>, config: &SyncConfig) -> Self {
        Self::new(fetcher, config.concurrency)
    }

    /// Compute the next ledger and the list of changed packages
    ///
    /// `previous` is the ledger of the last run (empty on the first run). The
    /// active set is processed before the retired set; within a set, the
    /// change list follows fetch completion order, so only its membership is
    /// stable across runs.
    pub async fn synchronize(
        &self,
        catalog: &Catalog,
        previous: &Ledger,
        logger: &dyn ChangeLogger,
        force_update: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let mut ledger = Ledger::new();
        let mut changes = Vec::new();

        let active = catalog.active().iter().map(|pkg| PackageJob {
            name: &pkg.name,
            class: PackageClass::Active,
            content_hash: Some(pkg.content_hash.as_str()),
        });
        let retired = catalog.retired().iter().map(|pkg| PackageJob {
            name: &pkg.name,
            class: PackageClass::Retired,
            content_hash: None,
        });

        let active = self
            .reconcile_set(active, previous, logger, force_update)
            .await?;
        debug!("Reconciled {} active packages", active.len());

        let retired = self
            .reconcile_set(retired, previous, logger, force_update)
            .await?;
        debug!("Reconciled {} retired packages", retired.len());

        for (name, reconciled) in active.into_iter().chain(retired) {
            if reconciled.change.is_some() {
                changes.push(name.clone());
            }
            ledger.insert(name, reconciled.record);
        }

        info!(
            "Synchronized {} packages, {} changed",
            ledger.len(),
            changes.len()
        );

        Ok(SyncOutcome { changes, ledger })
    }

    /// Reconcile one package set, yielding results in completion order
    async fn reconcile_set<'a>(
        &self,
        jobs: impl Iterator<Item = PackageJob<'a>>,
        previous: &Ledger,
        logger: &dyn ChangeLogger,
        force_update: bool,
    ) -> Result<Vec<(String, Reconciled)>, SyncError> {
        stream::iter(jobs)
            .map(|job| self.reconcile_package(job, previous, logger, force_update))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
    }

    async fn reconcile_package(
        &self,
        job: PackageJob<'_>,
        previous: &Ledger,
        logger: &dyn ChangeLogger,
        force_update: bool,
    ) -> Result<(String, Reconciled), SyncError> {
        let remote = self.observe(job.name).await?;
        let remote_version = remote.version;

        let previous_state = job.content_hash.map(|content_hash| PreviousState {
            version: previous
                .get(job.name)
                .map_or(remote.version, |record| record.version),
            content_hash: content_hash.to_string(),
        });

        let reconciled = reconcile(job.class, previous_state.as_ref(), remote, force_update)
            .map_err(|e| match e {
                ReconcileError::DeprecatedUpstream => SyncError::Integrity {
                    package: job.name.to_string(),
                },
                ReconcileError::VersionOverflow => SyncError::VersionOverflow {
                    package: job.name.to_string(),
                    version: remote_version,
                },
            })?;

        if let Some(change) = reconciled.change {
            logger.log(&change.describe(job.name));
        }

        Ok((job.name.to_string(), reconciled))
    }

    /// Fetch the remote state of a package; unpublished packages are version 0
    async fn observe(&self, package_name: &str) -> Result<RemoteState, SyncError> {
        match self.fetcher.fetch_version_info(package_name).await {
            Ok(info) => RemoteState::try_from(info).map_err(|source| SyncError::Format {
                package: package_name.to_string(),
                source,
            }),
            Err(RegistryError::NotFound(_)) => {
                debug!("{} has never been published", package_name);
                Ok(RemoteState::not_found())
            }
            Err(source) => Err(SyncError::Transport {
                package: package_name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActivePackage, RetiredPackage};
    use crate::version::registry::MockMetadataFetcher;
    use crate::version::types::{RemoteVersionInfo, VersionRecord};
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn info(latest_version: &str, content_hash: &str, deprecated: bool) -> RemoteVersionInfo {
        RemoteVersionInfo {
            latest_version: latest_version.to_string(),
            content_hash: content_hash.to_string(),
            deprecated,
        }
    }

    fn active(name: &str, content_hash: &str) -> ActivePackage {
        ActivePackage {
            name: name.to_string(),
            content_hash: content_hash.to_string(),
        }
    }

    fn retired(name: &str) -> RetiredPackage {
        RetiredPackage {
            name: name.to_string(),
        }
    }

    fn record(version: u64, content_hash: &str, deprecated: bool) -> VersionRecord {
        VersionRecord {
            version,
            content_hash: content_hash.to_string(),
            deprecated,
        }
    }

    /// Collects change lines for assertions
    #[derive(Default)]
    struct CollectingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl ChangeLogger for CollectingLogger {
        fn log(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[tokio::test]
    async fn synchronize_bumps_active_package_with_new_content() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .withf(|name| name == "foo")
            .times(1)
            .returning(|_| Ok(info("2.0.9", "xyz", false)));

        let catalog = Catalog::new(vec![active("foo", "abc")], vec![]).unwrap();
        let previous: Ledger = [("foo".to_string(), record(5, "abc", false))]
            .into_iter()
            .collect();
        let logger = CollectingLogger::default();

        let outcome = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &previous, &logger, false)
            .await
            .unwrap();

        assert_eq!(outcome.changes, vec!["foo".to_string()]);
        assert_eq!(outcome.ledger.get("foo"), Some(&record(10, "abc", false)));
        assert_eq!(*logger.lines.lock().unwrap(), vec!["Changed: foo".to_string()]);
    }

    #[tokio::test]
    async fn synchronize_treats_not_found_as_unpublished() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .returning(|name| Err(RegistryError::NotFound(name.to_string())));

        let catalog = Catalog::new(vec![active("fresh", "abc")], vec![retired("gone")]).unwrap();
        let logger = CollectingLogger::default();

        let outcome = Synchronizer::new(Arc::new(fetcher), 2)
            .synchronize(&catalog, &Ledger::new(), &logger, false)
            .await
            .unwrap();

        assert_eq!(outcome.changes, vec!["fresh".to_string(), "gone".to_string()]);
        assert_eq!(outcome.ledger.get("fresh"), Some(&record(1, "abc", false)));
        assert_eq!(outcome.ledger.get("gone"), Some(&record(1, "", false)));
        assert_eq!(
            *logger.lines.lock().unwrap(),
            vec!["Changed: fresh".to_string(), "Now deprecated: gone".to_string()]
        );
    }

    #[tokio::test]
    async fn synchronize_fails_with_integrity_error_for_deprecated_active_package() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .returning(|_| Ok(info("1.0.4", "abc", true)));

        let catalog = Catalog::new(vec![active("stale", "abc")], vec![]).unwrap();

        let result = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &Ledger::new(), &CollectingLogger::default(), false)
            .await;

        assert!(matches!(result, Err(SyncError::Integrity { package }) if package == "stale"));
    }

    #[tokio::test]
    async fn synchronize_fails_with_transport_error_when_fetch_fails() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .withf(|name| name == "ok")
            .returning(|_| Ok(info("1.0.0", "abc", false)));
        fetcher
            .expect_fetch_version_info()
            .withf(|name| name == "broken")
            .returning(|_| Err(RegistryError::InvalidResponse("Unexpected status: 500".into())));

        let catalog =
            Catalog::new(vec![active("ok", "abc"), active("broken", "abc")], vec![]).unwrap();

        let result = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &Ledger::new(), &CollectingLogger::default(), false)
            .await;

        assert!(matches!(result, Err(SyncError::Transport { package, .. }) if package == "broken"));
    }

    #[tokio::test]
    async fn synchronize_fails_with_format_error_for_unexpected_semver() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .returning(|_| Ok(info("1.0.0-next.1", "abc", false)));

        let catalog = Catalog::new(vec![], vec![retired("odd")]).unwrap();

        let result = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &Ledger::new(), &CollectingLogger::default(), false)
            .await;

        assert!(matches!(result, Err(SyncError::Format { package, .. }) if package == "odd"));
    }

    #[tokio::test]
    async fn synchronize_fails_when_published_patch_cannot_be_bumped() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .returning(|_| Ok(info("1.2.18446744073709551615", "abc", false)));

        let catalog = Catalog::new(vec![], vec![retired("maxed")]).unwrap();

        let result = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &Ledger::new(), &CollectingLogger::default(), false)
            .await;

        assert!(matches!(
            result,
            Err(SyncError::VersionOverflow { package, version })
                if package == "maxed" && version == u64::MAX
        ));
    }

    #[tokio::test]
    async fn synchronize_skips_retired_set_after_active_failure() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .withf(|name| name == "stale")
            .times(1)
            .returning(|_| Ok(info("1.0.0", "abc", true)));
        fetcher
            .expect_fetch_version_info()
            .withf(|name| name == "gone")
            .times(0);

        let catalog = Catalog::new(vec![active("stale", "abc")], vec![retired("gone")]).unwrap();

        let result = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(&catalog, &Ledger::new(), &CollectingLogger::default(), false)
            .await;

        assert!(matches!(result, Err(SyncError::Integrity { .. })));
    }

    #[tokio::test]
    async fn synchronize_with_force_update_reports_every_active_package() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher
            .expect_fetch_version_info()
            .returning(|_| Ok(info("3.1.4", "same", false)));

        let catalog = Catalog::new(
            vec![active("a", "same"), active("b", "same"), active("c", "same")],
            vec![],
        )
        .unwrap();
        let previous: Ledger = ["a", "b", "c"]
            .into_iter()
            .map(|name| (name.to_string(), record(4, "same", false)))
            .collect();

        let outcome = Synchronizer::new(Arc::new(fetcher), 2)
            .synchronize(&catalog, &previous, &CollectingLogger::default(), true)
            .await
            .unwrap();

        let changed: HashSet<_> = outcome.changes.iter().map(String::as_str).collect();
        assert_eq!(changed, HashSet::from(["a", "b", "c"]));
        for name in ["a", "b", "c"] {
            assert_eq!(outcome.ledger.get(name), Some(&record(5, "same", false)));
        }
    }

    #[tokio::test]
    async fn synchronize_handles_empty_catalog() {
        let mut fetcher = MockMetadataFetcher::new();
        // fetch_version_info should never be called
        fetcher.expect_fetch_version_info().times(0);

        let outcome = Synchronizer::new(Arc::new(fetcher), 25)
            .synchronize(
                &Catalog::default(),
                &Ledger::new(),
                &CollectingLogger::default(),
                false,
            )
            .await
            .unwrap();

        assert!(outcome.changes.is_empty());
        assert!(outcome.ledger.is_empty());
    }
}
