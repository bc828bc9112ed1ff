//! Pre-publish snapshots and their lifecycle

pub mod manager;

pub use manager::{CapturedSnapshot, Snapshot, SnapshotManager};
