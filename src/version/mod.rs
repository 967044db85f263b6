//! Version ledger layer
//!
//! This module provides the core functionality for fetching published package
//! metadata, deciding the next version of each package, and persisting the
//! resulting ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│  Reconcile  │────▶│    Store    │
//! │  (fetch)    │     │  (decide)   │     │  (persist)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Registries  │     │   Semver    │
//! │    (npm)    │     │  (patch #)  │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error types for registry, store, catalog and sync operations
//! - [`reconcile`]: Per-package version allocation for active and retired packages
//! - [`registry`]: Fetcher trait for reading published metadata
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`semver`]: Patch counter extraction from generated versions
//! - [`store`]: JSON ledger and newline-delimited change list persistence
//! - [`types`]: Ledger records and remote observations

pub mod error;
pub mod reconcile;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod store;
pub mod types;
