//! Publish state management: checkpoints and their persistence

pub mod checkpoint;
pub mod store;

pub use checkpoint::Checkpoint;
pub use store::{CheckpointStorage, FileCheckpointStore};
