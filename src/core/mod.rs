//! Core business logic: merge, publish, state, and snapshots

pub mod merge;
pub mod publish;
pub mod snapshot;
pub mod state;
