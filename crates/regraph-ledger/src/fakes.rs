//! In-memory fakes for `LedgerStore` (testing only)
//!
//! `MemoryLedgerStore` keeps every saved snapshot so tests can check what
//! the durable state looked like after each mutation. `FailingLedgerStore`
//! starts rejecting saves after a configurable number of successes.

use std::sync::Mutex;

use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerEntries, LedgerStore};

// ---------------------------------------------------------------------------
// MemoryLedgerStore
// ---------------------------------------------------------------------------

/// In-memory ledger store with a full save history.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    history: Mutex<Vec<LedgerEntries>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `entries`, as if saved by an earlier batch.
    pub fn with_entries(entries: LedgerEntries) -> Self {
        Self {
            history: Mutex::new(vec![entries]),
        }
    }

    /// Every snapshot saved so far, oldest first.
    pub fn history(&self) -> Vec<LedgerEntries> {
        self.history.lock().unwrap().clone()
    }

    pub fn last_saved(&self) -> Option<LedgerEntries> {
        self.history.lock().unwrap().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> LedgerResult<Option<LedgerEntries>> {
        Ok(self.last_saved())
    }

    fn save(&self, entries: &LedgerEntries) -> LedgerResult<()> {
        self.history.lock().unwrap().push(entries.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// FailingLedgerStore
// ---------------------------------------------------------------------------

/// Store that accepts `allowed_saves` saves and fails every later one.
#[derive(Debug)]
pub struct FailingLedgerStore {
    inner: MemoryLedgerStore,
    allowed_saves: usize,
}

impl FailingLedgerStore {
    pub fn new(allowed_saves: usize) -> Self {
        Self {
            inner: MemoryLedgerStore::new(),
            allowed_saves,
        }
    }

    pub fn last_saved(&self) -> Option<LedgerEntries> {
        self.inner.last_saved()
    }
}

impl LedgerStore for FailingLedgerStore {
    fn load(&self) -> LedgerResult<Option<LedgerEntries>> {
        self.inner.load()
    }

    fn save(&self, entries: &LedgerEntries) -> LedgerResult<()> {
        if self.inner.save_count() >= self.allowed_saves {
            return Err(LedgerError::Io {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save(entries)
    }

    fn location(&self) -> String {
        "memory (failing)".to_string()
    }
}
