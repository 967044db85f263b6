//! One full cycle: load the previous ledger, synchronize, persist

use tracing::info;

use crate::catalog::Catalog;
use crate::sync::logger::ChangeLogger;
use crate::sync::synchronizer::{SyncOutcome, Synchronizer};
use crate::version::error::RunError;
use crate::version::store::LedgerStore;
use crate::version::types::Ledger;

/// Synchronize `catalog` against the ledger in `store` and save the result
///
/// A missing ledger document starts the run from an empty ledger. The ledger
/// and the change list are written only after synchronization succeeds; on
/// any failure both files are left as they were.
pub async fn run(
    store: &LedgerStore,
    synchronizer: &Synchronizer,
    catalog: &Catalog,
    logger: &dyn ChangeLogger,
    force_update: bool,
) -> Result<SyncOutcome, RunError> {
    let previous = if store.exists() {
        store.load()?
    } else {
        info!("No ledger at {:?}, starting from scratch", store.versions_path());
        Ledger::new()
    };

    let outcome = synchronizer
        .synchronize(catalog, &previous, logger, force_update)
        .await?;

    store.save(&outcome.ledger)?;
    store.save_changes(&outcome.changes)?;

    Ok(outcome)
}
