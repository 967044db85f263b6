//! Version allocation: decide a package's next record from its remote state

use crate::version::types::{RemoteState, VersionRecord};

/// Which rule applies to a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageClass {
    /// Published from local content; must never be deprecated upstream
    Active,
    /// No longer needed; expected to end up deprecated upstream
    Retired,
}

/// What the ledger knew about a package before this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousState {
    pub version: u64,
    pub content_hash: String,
}

/// Outcome of reconciling a single package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub record: VersionRecord,
    pub change: Option<ChangeKind>,
}

/// Why a package was reported as changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Local content differs from what is published
    Changed,
    /// Retired package that the registry does not report as deprecated yet
    NowDeprecated,
}

impl ChangeKind {
    /// Human readable log line for a changed package
    pub fn describe(&self, package_name: &str) -> String {
        match self {
            ChangeKind::Changed => format!("Changed: {}", package_name),
            ChangeKind::NowDeprecated => format!("Now deprecated: {}", package_name),
        }
    }
}

/// Why a package could not be reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileError {
    /// An active package is deprecated on the registry
    DeprecatedUpstream,
    /// The published patch counter cannot be bumped any further
    VersionOverflow,
}

/// Decide the next record for a package
///
/// Active packages are bumped to `remote.version + 1` when forced, when
/// nothing is known locally, or when the local fingerprint differs from the
/// published one; the local fingerprint is kept so the record describes the
/// content about to be published. Retired packages are bumped until the
/// registry reports them as deprecated.
pub fn reconcile(
    class: PackageClass,
    previous: Option<&PreviousState>,
    remote: RemoteState,
    force_update: bool,
) -> Result<Reconciled, ReconcileError> {
    match class {
        PackageClass::Active => reconcile_active(previous, remote, force_update),
        PackageClass::Retired => reconcile_retired(remote),
    }
}

fn bump(version: u64) -> Result<u64, ReconcileError> {
    version
        .checked_add(1)
        .ok_or(ReconcileError::VersionOverflow)
}

fn reconcile_active(
    previous: Option<&PreviousState>,
    remote: RemoteState,
    force_update: bool,
) -> Result<Reconciled, ReconcileError> {
    if remote.deprecated {
        return Err(ReconcileError::DeprecatedUpstream);
    }

    let reconciled = match previous {
        Some(prev) if !force_update && prev.content_hash == remote.content_hash => Reconciled {
            record: VersionRecord {
                version: prev.version,
                content_hash: prev.content_hash.clone(),
                deprecated: false,
            },
            change: None,
        },
        _ => Reconciled {
            record: VersionRecord {
                version: bump(remote.version)?,
                content_hash: previous.map_or(remote.content_hash, |p| p.content_hash.clone()),
                deprecated: false,
            },
            change: Some(ChangeKind::Changed),
        },
    };

    Ok(reconciled)
}

fn reconcile_retired(remote: RemoteState) -> Result<Reconciled, ReconcileError> {
    let reconciled = if remote.deprecated {
        Reconciled {
            record: VersionRecord {
                version: remote.version,
                content_hash: remote.content_hash,
                deprecated: true,
            },
            change: None,
        }
    } else {
        Reconciled {
            record: VersionRecord {
                version: bump(remote.version)?,
                content_hash: remote.content_hash,
                deprecated: false,
            },
            change: Some(ChangeKind::NowDeprecated),
        }
    };

    Ok(reconciled)
}
