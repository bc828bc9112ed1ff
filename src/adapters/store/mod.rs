//! Remote store adapters

pub mod factory;
pub mod memory;
pub mod rest;
pub mod traits;

pub use factory::create_store;
pub use memory::{Fault, InMemoryStore};
pub use rest::RestStore;
pub use traits::{RemoteStore, RowRange, StructuralOp, StructureInfo, UpdateOutcome};
