//! File-based storage backend.
//!
//! Each key is stored as its own file guarded by `flock`. Reads take a shared
//! lock and writes an exclusive one, so a reader never sees a torn value.
//! [`KeyValueStore::update`] holds the exclusive lock across read, apply and
//! write, which keeps concurrent read-modify-write cycles from separate
//! processes sharing a data directory from losing each other's changes.
//! Plain `get` followed by `set` gives no such guarantee.
//!
//! Directory structure:
//! ```text
//! data/
//! └── kv/
//!     └── {sanitized key}.value
//! ```

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use crate::config::FileStorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{KeyValueStore, Updater};

/// File-based key-value store.
pub struct FileStore {
    /// Base data directory.
    base_dir: PathBuf,
    /// Directory holding one file per key.
    kv_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();
        let kv_dir = base_dir.join("kv");

        for dir in [&base_dir, &kv_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                StorageError::FileIO(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }

        Ok(Self { base_dir, kv_dir })
    }

    /// Get the file path for a key.
    fn value_path(&self, key: &str) -> PathBuf {
        self.kv_dir.join(format!("{}.value", sanitize_name(key)))
    }

    fn read_locked(path: &Path) -> StorageResult<Option<String>> {
        let mut file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut value = String::new();
        let read = file.read_to_string(&mut value);

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        read?;
        Ok(Some(value))
    }

    fn write_locked(path: &Path, value: &str) -> StorageResult<()> {
        // Truncate only after the lock is held
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let written = overwrite(&mut file, value);

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        written.map_err(Into::into)
    }

    fn update_locked(path: &Path, apply: Updater) -> StorageResult<String> {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let result = read_apply_write(&mut file, apply);

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        result
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Self::read_locked(&self.value_path(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::write_locked(&self.value_path(key), value)
    }

    async fn update(&self, key: &str, apply: Updater) -> StorageResult<String> {
        Self::update_locked(&self.value_path(key), apply)
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        match std::fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        let test_file = self.base_dir.join(".health_check");
        tokio::fs::write(&test_file, b"ok")
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        tokio::fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Runs under the caller's exclusive lock. A freshly created file is empty and
/// counts as no value.
fn read_apply_write(file: &mut std::fs::File, apply: Updater) -> StorageResult<String> {
    let mut current = String::new();
    file.read_to_string(&mut current)?;

    let next = apply((!current.is_empty()).then_some(current))?;
    overwrite(file, &next)?;
    Ok(next)
}

fn overwrite(file: &mut std::fs::File, value: &str) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// Sanitize a key for use as a filename.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::updater;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };
        let store = FileStore::new(&config).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (store, _temp) = create_test_store();
        assert!(store.health_check().await.is_ok());
        assert_eq!(store.backend_name(), "file");
    }

    #[tokio::test]
    async fn test_get_set_remove() {
        let (store, _temp) = create_test_store();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("ids", "[3,2,1]").await.unwrap();
        assert_eq!(store.get("ids").await.unwrap().as_deref(), Some("[3,2,1]"));

        // Shorter value fully replaces the longer one
        store.set("ids", "[]").await.unwrap();
        assert_eq!(store.get("ids").await.unwrap().as_deref(), Some("[]"));

        assert!(store.remove("ids").await.unwrap());
        assert!(!store.remove("ids").await.unwrap());
        assert!(store.get("ids").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        FileStore::new(&config)
            .unwrap()
            .set("X-Privilege-Key", "secret")
            .await
            .unwrap();

        let reopened = FileStore::new(&config).unwrap();
        assert_eq!(
            reopened.get("X-Privilege-Key").await.unwrap().as_deref(),
            Some("secret")
        );
    }

    #[tokio::test]
    async fn test_update_reads_current_value() {
        let (store, _temp) = create_test_store();

        let written = store
            .update("ids", updater(|current| {
                assert!(current.is_none());
                Ok("[1]".to_string())
            }))
            .await
            .unwrap();
        assert_eq!(written, "[1]");

        store
            .update("ids", updater(|current| {
                assert_eq!(current.as_deref(), Some("[1]"));
                Ok("[2,1]".to_string())
            }))
            .await
            .unwrap();
        assert_eq!(store.get("ids").await.unwrap().as_deref(), Some("[2,1]"));

        let failed = store
            .update("ids", updater(|_| Err(StorageError::Serialization("bad".into()))))
            .await;
        assert!(failed.is_err());
        assert_eq!(store.get("ids").await.unwrap().as_deref(), Some("[2,1]"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_from_separate_stores_are_not_lost() {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let store = FileStore::new(&config).unwrap();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store
                        .update("counter", updater(|current| {
                            let n: u64 = current.as_deref().unwrap_or("0").parse().unwrap();
                            Ok((n + 1).to_string())
                        }))
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let store = FileStore::new(&config).unwrap();
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("200"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("X-Privilege-Key"), "X-Privilege-Key");
        assert_eq!(sanitize_name("../etc/passwd"), "___etc_passwd");
    }
}
