//! External system adapters

pub mod store;
