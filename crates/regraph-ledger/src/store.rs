//! Storage backing for the result ledger.
//!
//! `LedgerStore` is the durable half of the ledger: it loads the whole
//! mapping once and overwrites it wholesale on every save. Saves are
//! synchronous and complete before returning.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::record::ResultRecord;

/// Document identifier -> ordered per-unit records, in the order documents
/// were first started.
pub type LedgerEntries = IndexMap<String, Vec<ResultRecord>>;

/// Durable storage for ledger entries.
///
/// Guarantees:
/// - `load()` returns `Ok(None)` when nothing has been saved yet.
/// - `save(entries)` replaces all prior content; a later `load()` returns `entries`.
pub trait LedgerStore: Send + Sync {
    /// Read the persisted mapping, if any.
    fn load(&self) -> LedgerResult<Option<LedgerEntries>>;

    /// Overwrite the persisted mapping.
    fn save(&self, entries: &LedgerEntries) -> LedgerResult<()>;

    /// Human-readable location used in log lines.
    fn location(&self) -> String;
}

/// Ledger stored as one pretty-printed JSON document.
///
/// Writes go to a temp file in the same directory and are renamed over the
/// ledger, so readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Encode entries with four-space indentation.
fn encode_entries(entries: &LedgerEntries) -> LedgerResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> LedgerResult<Option<LedgerEntries>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger file yet");
                return Ok(None);
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let entries = serde_json::from_str(&content).map_err(|e| LedgerError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &LedgerEntries) -> LedgerResult<()> {
        let bytes = encode_entries(entries)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;

        debug!(path = %self.path.display(), documents = entries.len(), "Ledger saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
