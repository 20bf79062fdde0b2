//! Identifier ledger.
//!
//! Newest-first list of generation identifiers kept in durable storage, used to
//! rebuild history across sessions. New identifiers are always unshifted (no
//! deduplication); once the list exceeds [`LEDGER_CAPACITY`] the oldest
//! entries fall off the tail. Recording goes through the store's atomic
//! update, so clients sharing one data directory never drop each other's ids.

use std::sync::Arc;

use tracing::warn;

use crate::error::StorageResult;
use crate::storage::{KeyValueStore, updater};

/// Maximum number of identifiers retained.
pub const LEDGER_CAPACITY: usize = 100;

/// Storage key of the serialized identifier list.
pub const LEDGER_KEY: &str = "imagegen-image-ids";

/// Capped, durable, newest-first identifier list.
pub struct IdentifierLedger {
    store: Arc<dyn KeyValueStore>,
}

impl IdentifierLedger {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record a new identifier at the head, truncating to capacity, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or written.
    pub async fn record(&self, id: i64) -> StorageResult<()> {
        self.store
            .update(
                LEDGER_KEY,
                updater(move |raw| {
                    let mut ids = parse_ids(raw.as_deref());
                    ids.insert(0, id);
                    ids.truncate(LEDGER_CAPACITY);
                    Ok(serde_json::to_string(&ids)?)
                }),
            )
            .await?;
        Ok(())
    }

    /// All identifiers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn ids(&self) -> StorageResult<Vec<i64>> {
        let raw = self.store.get(LEDGER_KEY).await?;
        Ok(parse_ids(raw.as_deref()))
    }

    /// Number of identifiers held.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn len(&self) -> StorageResult<usize> {
        Ok(self.ids().await?.len())
    }

    /// Whether the ledger is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.ids().await?.is_empty())
    }

    /// Identifiers on 1-based page `page_number`: the slice
    /// `[(page_number - 1) * page_size, page_number * page_size)`.
    ///
    /// Page 0 and a zero page size are empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn page(&self, page_number: usize, page_size: usize) -> StorageResult<Vec<i64>> {
        let ids = self.ids().await?;
        Ok(page_slice(&ids, page_number, page_size).to_vec())
    }

    /// Page count for `page_size`, based on the raw identifier count.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn total_pages(&self, page_size: usize) -> StorageResult<usize> {
        if page_size == 0 {
            return Ok(0);
        }
        Ok(self.len().await?.div_ceil(page_size))
    }

    /// Forget every identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list cannot be removed.
    pub async fn clear(&self) -> StorageResult<()> {
        self.store.remove(LEDGER_KEY).await?;
        Ok(())
    }

}

fn parse_ids(raw: Option<&str>) -> Vec<i64> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<i64>>(raw) {
        Ok(ids) => ids,
        Err(e) => {
            // A corrupt list must not block new generations
            warn!(error = %e, "Discarding unreadable identifier ledger");
            Vec::new()
        }
    }
}

/// 1-based page slice; out-of-range pages are empty.
pub(crate) fn page_slice<T>(items: &[T], page_number: usize, page_size: usize) -> &[T] {
    if page_number == 0 || page_size == 0 {
        return &[];
    }
    let start = (page_number - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn ledger() -> (IdentifierLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (IdentifierLedger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_record_unshifts() {
        let (ledger, _) = ledger();
        ledger.record(1).await.unwrap();
        ledger.record(2).await.unwrap();
        ledger.record(2).await.unwrap();

        assert_eq!(ledger.ids().await.unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_length_grows_to_capacity() {
        let (ledger, _) = ledger();
        for id in 1..=150 {
            let before = ledger.len().await.unwrap();
            ledger.record(id).await.unwrap();
            assert_eq!(
                ledger.len().await.unwrap(),
                (before + 1).min(LEDGER_CAPACITY)
            );
        }
    }

    #[tokio::test]
    async fn test_full_ledger_evicts_oldest() {
        let (ledger, _) = ledger();
        for id in 1..=100 {
            ledger.record(id).await.unwrap();
        }
        assert_eq!(ledger.ids().await.unwrap().last(), Some(&1));

        ledger.record(101).await.unwrap();
        let ids = ledger.ids().await.unwrap();
        assert_eq!(ids.len(), 100);
        assert_eq!(ids.first(), Some(&101));
        assert_eq!(ids.last(), Some(&2));
    }

    #[tokio::test]
    async fn test_persisted_as_json_array() {
        let (ledger, store) = ledger();
        ledger.record(5).await.unwrap();
        ledger.record(6).await.unwrap();

        assert_eq!(store.get(LEDGER_KEY).await.unwrap().as_deref(), Some("[6,5]"));

        // A second ledger over the same store sees the same list
        let reopened = IdentifierLedger::new(store);
        assert_eq!(reopened.ids().await.unwrap(), vec![6, 5]);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_treated_as_empty() {
        let (ledger, store) = ledger();
        store.set(LEDGER_KEY, "not json").await.unwrap();

        assert!(ledger.is_empty().await.unwrap());
        ledger.record(9).await.unwrap();
        assert_eq!(ledger.ids().await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let (ledger, _) = ledger();
        for id in 1..=9 {
            ledger.record(id).await.unwrap();
        }

        assert_eq!(
            ledger.page(1, 20).await.unwrap(),
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1]
        );
        assert!(ledger.page(2, 20).await.unwrap().is_empty());
        assert_eq!(ledger.page(2, 4).await.unwrap(), vec![5, 4, 3, 2]);
        assert_eq!(ledger.page(3, 4).await.unwrap(), vec![1]);
        assert!(ledger.page(0, 4).await.unwrap().is_empty());
        assert!(ledger.page(1, 0).await.unwrap().is_empty());

        assert_eq!(ledger.total_pages(20).await.unwrap(), 1);
        assert_eq!(ledger.total_pages(4).await.unwrap(), 3);
        assert_eq!(ledger.total_pages(0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let (ledger, _) = ledger();
        ledger.record(1).await.unwrap();
        ledger.clear().await.unwrap();
        assert!(ledger.is_empty().await.unwrap());
        assert_eq!(ledger.total_pages(20).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ledgers_sharing_a_data_dir_keep_every_id() {
        use crate::config::FileStorageConfig;
        use crate::storage::FileStore;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };
        let first = IdentifierLedger::new(Arc::new(FileStore::new(&config).unwrap()));
        let second = IdentifierLedger::new(Arc::new(FileStore::new(&config).unwrap()));

        let a = tokio::spawn(async move {
            for id in 1..=40 {
                first.record(id).await.unwrap();
            }
        });
        let b = tokio::spawn(async move {
            for id in 1001..=1040 {
                second.record(id).await.unwrap();
            }
        });
        a.await.unwrap();
        b.await.unwrap();

        let reopened = IdentifierLedger::new(Arc::new(FileStore::new(&config).unwrap()));
        let ids = reopened.ids().await.unwrap();
        assert_eq!(ids.len(), 80);
        for id in (1..=40).chain(1001..=1040) {
            assert!(ids.contains(&id), "missing {id}");
        }
    }

    #[test]
    fn test_page_slice_huge_page_number() {
        let items = [1, 2, 3];
        assert!(page_slice(&items, usize::MAX, usize::MAX).is_empty());
    }
}
