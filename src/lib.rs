//! tabsync - snapshot merge and resilient publishing
//!
//! tabsync merges N tab-separated snapshot files keyed by a primary
//! identifier into one deduplicated, last-write-wins record set with
//! per-record update history, then publishes that record set into a remote
//! tabular store using adaptively sized batches, a resumable checkpoint, an
//! atomic staged cut-over, and snapshot-based rollback.
//!
//! # Architecture
//!
//! The crate follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - TOML configuration with environment overrides
//! - [`domain`] - Core types: records, identifiers, errors
//! - [`core`] - Business logic: merge, publish, state, snapshots
//! - [`adapters`] - Remote store clients (REST and in-memory)
//! - [`logging`] - Structured logging setup

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

// Re-export the most commonly used types
pub use domain::errors::{StoreError, SyncError};
pub use domain::ids::TargetId;
pub use domain::result::Result;
