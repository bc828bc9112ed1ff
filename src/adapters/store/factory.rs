//! Store adapter factory

use crate::adapters::store::memory::InMemoryStore;
use crate::adapters::store::rest::RestStore;
use crate::adapters::store::traits::RemoteStore;
use crate::config::{StoreBackend, StoreConfig};
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Build the store adapter selected by the configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn RemoteStore>> {
    match config.backend {
        StoreBackend::Rest => {
            let token = config.api_token.clone().ok_or_else(|| {
                SyncError::Configuration("store.api_token is required for the rest backend".to_string())
            })?;
            let store = RestStore::new(config.base_url.clone(), token, config.timeout_seconds)?;
            tracing::info!(base_url = %config.base_url, "Using REST store backend");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store backend");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
