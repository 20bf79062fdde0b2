//! Storage trait definitions.
//!
//! The client only needs a durable string key-value capability that survives
//! process restarts. Single-key read-modify-write goes through
//! [`KeyValueStore::update`], which each backend runs atomically.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Computes the new value of a key from its current value.
pub type Updater = Box<dyn FnOnce(Option<String>) -> StorageResult<String> + Send>;

/// Box a closure as an [`Updater`].
pub fn updater<F>(apply: F) -> Updater
where
    F: FnOnce(Option<String>) -> StorageResult<String> + Send + 'static,
{
    Box::new(apply)
}

/// Durable key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Replace the value under `key` with `apply(current)` and return what was
    /// written. No other writer to `key`, in this process or another one
    /// sharing the backend, can interleave between the read and the write.
    /// When `apply` fails nothing is written.
    async fn update(&self, key: &str, apply: Updater) -> StorageResult<String>;

    /// Remove `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}
