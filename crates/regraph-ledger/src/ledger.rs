//! In-memory result ledger bound to a durable store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::reconcile::{reconcile, ExportSlot};
use crate::record::{LedgerStatus, ResultRecord};
use crate::store::{LedgerEntries, LedgerStore};

/// Document identifier -> ordered per-unit result records.
///
/// Every mutating method persists the whole mapping before returning, so
/// the store always reflects the last completed mutation.
pub struct ResultLedger {
    entries: LedgerEntries,
    store: Arc<dyn LedgerStore>,
}

impl std::fmt::Debug for ResultLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultLedger")
            .field("location", &self.store.location())
            .field("documents", &self.entries.len())
            .finish()
    }
}

impl ResultLedger {
    /// Load the ledger from `store`. A store with nothing saved yields an empty ledger.
    pub fn load(store: Arc<dyn LedgerStore>) -> LedgerResult<Self> {
        let entries = store.load()?.unwrap_or_default();
        info!(
            location = %store.location(),
            documents = entries.len(),
            "Loaded result ledger"
        );
        Ok(Self { entries, store })
    }

    /// Whether any entry exists for `doc_id`, even an empty one.
    pub fn has(&self, doc_id: &str) -> bool {
        self.entries.contains_key(doc_id)
    }

    pub fn records(&self, doc_id: &str) -> Option<&[ResultRecord]> {
        self.entries.get(doc_id).map(Vec::as_slice)
    }

    /// Where the ledger is persisted.
    pub fn location(&self) -> String {
        self.store.location()
    }

    pub fn entries(&self) -> &LedgerEntries {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the full mapping to the store.
    pub fn persist(&self) -> LedgerResult<()> {
        self.store.save(&self.entries)
    }

    /// Create an empty entry for `doc_id` and persist it.
    ///
    /// Must run before any fallible conversion work so a crash leaves a marker.
    pub fn mark_started(&mut self, doc_id: &str) -> LedgerResult<()> {
        self.entries.insert(doc_id.to_string(), Vec::new());
        debug!(doc_id = %doc_id, "Marked document as started");
        self.persist()
    }

    /// Append one record to a started document and persist.
    pub fn append(&mut self, doc_id: &str, record: ResultRecord) -> LedgerResult<()> {
        self.entry_mut(doc_id)?.push(record);
        self.persist()
    }

    /// Merge generator statuses into the document's records and persist.
    ///
    /// On error the records are left untouched.
    pub fn reconcile<S: AsRef<str>>(
        &mut self,
        doc_id: &str,
        slots: &[ExportSlot],
        statuses: &[S],
    ) -> LedgerResult<()> {
        let current = self.entry_mut(doc_id)?.clone();
        let merged = reconcile(doc_id, current, slots, statuses)?;
        *self.entry_mut(doc_id)? = merged;
        self.persist()
    }

    /// Remove a document's entry so the next batch reprocesses it.
    pub fn forget(&mut self, doc_id: &str) -> LedgerResult<bool> {
        let removed = self.entries.shift_remove(doc_id).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Documents whose records include an `Exception`, or which hold no records.
    pub fn failed_documents(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, records)| {
                records.is_empty()
                    || records
                        .iter()
                        .any(|r| r.status == Some(LedgerStatus::Exception))
            })
            .map(|(doc_id, _)| doc_id.clone())
            .collect()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary {
            documents: self.entries.len(),
            ..Default::default()
        };
        for (doc_id, records) in &self.entries {
            if records.is_empty() {
                summary.pending.push(doc_id.clone());
            }
            for record in records {
                match record.status {
                    Some(LedgerStatus::Success) => summary.success += 1,
                    Some(LedgerStatus::Skip) => summary.skip += 1,
                    Some(LedgerStatus::Exception) => summary.exception += 1,
                    None => summary.unreconciled += 1,
                }
            }
        }
        summary
    }

    fn entry_mut(&mut self, doc_id: &str) -> LedgerResult<&mut Vec<ResultRecord>> {
        self.entries
            .get_mut(doc_id)
            .ok_or_else(|| LedgerError::UnknownDocument {
                doc_id: doc_id.to_string(),
            })
    }
}

/// Record counts across the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub documents: usize,
    pub success: usize,
    pub skip: usize,
    pub exception: usize,
    /// Export-time records that never got a status.
    pub unreconciled: usize,
    /// Documents with an empty entry (started, nothing recorded).
    pub pending: Vec<String>,
}
