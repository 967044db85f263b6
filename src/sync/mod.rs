//! Synchronization layer
//!
//! Drives a reconciliation pass over the catalog and reports changes.
//!
//! # Modules
//!
//! - [`logger`]: Sinks for per-package change lines
//! - [`run`]: Load, synchronize and persist in one step
//! - [`synchronizer`]: Bounded-concurrency fetch and reconcile over a catalog

pub mod logger;
pub mod run;
pub mod synchronizer;

pub use logger::{ChangeLogger, TracingLogger};
pub use run::run;
pub use synchronizer::{SyncOutcome, Synchronizer};
