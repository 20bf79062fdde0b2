//! Privilege key store.
//!
//! The privilege key is an opaque client-held credential passed through in
//! `X-Privilege-Key`; whether it exempts a request from rate limiting or
//! verification is decided entirely by the service.

use std::sync::Arc;

use crate::error::StorageResult;
use crate::storage::KeyValueStore;

/// Storage key of the cached privilege key.
pub const PRIVILEGE_KEY: &str = "X-Privilege-Key";

/// Durable privilege key, with an optional configured override.
pub struct PrivilegeKeyStore {
    store: Arc<dyn KeyValueStore>,
    override_key: Option<String>,
}

impl PrivilegeKeyStore {
    pub fn new(store: Arc<dyn KeyValueStore>, override_key: Option<String>) -> Self {
        Self {
            store,
            override_key: override_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Key to send with the next request. The configured override wins over the
    /// stored key; a blank stored key counts as none.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored key cannot be read.
    pub async fn current(&self) -> StorageResult<Option<String>> {
        if let Some(key) = &self.override_key {
            return Ok(Some(key.clone()));
        }
        Ok(self
            .store
            .get(PRIVILEGE_KEY)
            .await?
            .filter(|k| !k.trim().is_empty()))
    }

    /// Persist a new key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be written.
    pub async fn set(&self, key: &str) -> StorageResult<()> {
        self.store.set(PRIVILEGE_KEY, key.trim()).await
    }

    /// Forget the stored key. Returns whether one was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be removed.
    pub async fn clear(&self) -> StorageResult<bool> {
        self.store.remove(PRIVILEGE_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_stored_key() {
        let store = PrivilegeKeyStore::new(Arc::new(MemoryStore::new()), None);
        assert!(store.current().await.unwrap().is_none());

        store.set("  vip-key \n").await.unwrap();
        assert_eq!(store.current().await.unwrap().as_deref(), Some("vip-key"));

        assert!(store.clear().await.unwrap());
        assert!(store.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_override_wins() {
        let backing = Arc::new(MemoryStore::new());
        backing.set(PRIVILEGE_KEY, "stored").await.unwrap();

        let store = PrivilegeKeyStore::new(backing.clone(), Some("configured".to_string()));
        assert_eq!(store.current().await.unwrap().as_deref(), Some("configured"));

        let blank_override = PrivilegeKeyStore::new(backing, Some("   ".to_string()));
        assert_eq!(
            blank_override.current().await.unwrap().as_deref(),
            Some("stored")
        );
    }
}
