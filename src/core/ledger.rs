//! Donation ledger - the append-only, most-recent-first list of submitted
//! donations.
//!
//! The whole list is rewritten to the key-value store after every append, so
//! what is on disk is always exactly what is in memory. If the ledger could
//! not be read at load time, nothing is written until a later read succeeds.

use super::donation::{DonationRecord, RecordId};
use crate::{
    errors::Result,
    storage::{self, KeyValueStore, TRANSACTIONS_KEY},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Submitted donations, newest first.
pub struct TransactionStore {
    store: Arc<dyn KeyValueStore>,
    records: Vec<DonationRecord>,
    synced: bool,
}

impl std::fmt::Debug for TransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionStore")
            .field("records", &self.records.len())
            .field("synced", &self.synced)
            .finish_non_exhaustive()
    }
}

impl TransactionStore {
    /// Reads the persisted ledger.
    ///
    /// A ledger that cannot be decoded is dropped and the store starts empty.
    /// A ledger that cannot be read also starts empty, but stays untouched on
    /// disk until [`TransactionStore::append`] manages to read it.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        match storage::load_collection(store.as_ref(), TRANSACTIONS_KEY).await {
            Ok(records) => {
                info!("Loaded {} donation record(s)", records.len());
                Self {
                    store,
                    records,
                    synced: true,
                }
            }
            Err(e) => {
                warn!("Failed to read donation ledger, will retry before writing: {}", e);
                Self {
                    store,
                    records: Vec::new(),
                    synced: false,
                }
            }
        }
    }

    async fn resync(&mut self) -> Result<()> {
        let stored: Vec<DonationRecord> =
            storage::load_collection(self.store.as_ref(), TRANSACTIONS_KEY).await?;
        info!("Re-read {} donation record(s)", stored.len());
        self.records = stored;
        self.synced = true;
        Ok(())
    }

    /// Adds `record` at the front and persists the full ledger.
    ///
    /// # Errors
    /// Returns an error when the write fails, or when the ledger has never
    /// been read successfully and still cannot be; the record is then not kept
    /// in memory either.
    pub async fn append(&mut self, record: DonationRecord) -> Result<()> {
        if !self.synced {
            self.resync().await?;
        }
        self.records.insert(0, record);
        let saved =
            storage::save_collection(self.store.as_ref(), TRANSACTIONS_KEY, &self.records).await;
        if let Err(e) = saved {
            self.records.remove(0);
            return Err(e);
        }
        debug!("Ledger now holds {} record(s)", self.records.len());
        Ok(())
    }

    /// Records whose scheduled date lies within `from..=to`.
    ///
    /// A missing bound leaves that side open. Ledger order is kept.
    #[must_use]
    pub fn filter_by_date_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<&DonationRecord> {
        self.records
            .iter()
            .filter(|r| from.is_none_or(|from| r.scheduled_date >= from))
            .filter(|r| to.is_none_or(|to| r.scheduled_date <= to))
            .collect()
    }

    /// Every record, newest first
    #[must_use]
    pub fn records(&self) -> &[DonationRecord] {
        &self.records
    }

    /// Looks a record up by id
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&DonationRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
