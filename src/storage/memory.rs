//! In-memory storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::storage::traits::{KeyValueStore, Updater};

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn update(&self, key: &str, apply: Updater) -> StorageResult<String> {
        let mut values = self.values.write();
        let next = apply(values.get(key).cloned())?;
        values.insert(key.to_string(), next.clone());
        Ok(next)
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.values.write().remove(key).is_some())
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
