//! Storage backend factory.
//!
//! Creates the appropriate storage backend based on configuration.

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StorageResult;
use crate::storage::file::FileStore;
use crate::storage::memory::MemoryStore;
use crate::storage::traits::KeyValueStore;

/// Create a storage backend based on configuration.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be initialized or fails
/// its health check.
pub async fn create_store(config: &StorageConfig) -> StorageResult<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::File => Arc::new(FileStore::new(&config.file)?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };

    store.health_check().await?;

    Ok(store)
}
