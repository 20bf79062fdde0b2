//! History pager.
//!
//! Pages are cut from the raw identifier ledger first; the records for that
//! slice are then fetched and the text filter is applied to what came back.
//! A filtered page can therefore hold fewer than `page_size` records while the
//! page count still reflects the unfiltered ledger.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::ImageRecord;
use crate::error::HistoryError;
use crate::service::ledger::{IdentifierLedger, page_slice};
use crate::transport::{MAX_BATCH_IDS, ServiceTransport};

/// One page of history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    /// Identifiers in the whole ledger.
    pub total_ids: usize,
    /// `ceil(total_ids / page_size)`, ignoring the filter.
    pub total_pages: usize,
    /// Records on this page in ledger order, after filtering.
    pub records: Vec<ImageRecord>,
    /// Records on this page removed by the filter.
    pub filtered_out: usize,
}

impl HistoryPage {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Reads history records for the identifiers in the ledger.
pub struct HistoryPager {
    transport: Arc<dyn ServiceTransport>,
    ledger: Arc<IdentifierLedger>,
}

impl HistoryPager {
    pub fn new(transport: Arc<dyn ServiceTransport>, ledger: Arc<IdentifierLedger>) -> Self {
        Self { transport, ledger }
    }

    /// Load page `page` of `page_size` identifiers, keeping only records that
    /// match `filter` (case-insensitive, on prompt or negative prompt).
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the lookup fails.
    pub async fn load_page(
        &self,
        page: usize,
        page_size: usize,
        filter: Option<&str>,
    ) -> Result<HistoryPage, HistoryError> {
        // One snapshot so the counts always agree with the slice
        let all_ids = self.ledger.ids().await?;
        let total_ids = all_ids.len();
        let ids = page_slice(&all_ids, page, page_size).to_vec();
        let total_pages = if page_size == 0 {
            0
        } else {
            total_ids.div_ceil(page_size)
        };

        let fetched = self.fetch_in_order(&ids).await?;
        let before = fetched.len();

        let records: Vec<ImageRecord> = match filter.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => fetched.into_iter().filter(|r| r.matches(query)).collect(),
            None => fetched,
        };
        let filtered_out = before - records.len();

        debug!(
            page,
            page_size,
            ids = ids.len(),
            records = records.len(),
            filtered_out,
            "History page loaded"
        );

        Ok(HistoryPage {
            page,
            page_size,
            total_ids,
            total_pages,
            records,
            filtered_out,
        })
    }

    /// Records for the newest `count` identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the lookup fails.
    pub async fn recent(&self, count: usize) -> Result<Vec<ImageRecord>, HistoryError> {
        Ok(self.load_page(1, count, None).await?.records)
    }

    /// Batch-look-up `ids` and return the records in the same order. Ids the
    /// service does not know are skipped.
    async fn fetch_in_order(&self, ids: &[i64]) -> Result<Vec<ImageRecord>, HistoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_IDS) {
            for record in self.transport.batch_lookup(chunk).await? {
                by_id.insert(record.id, record);
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}
