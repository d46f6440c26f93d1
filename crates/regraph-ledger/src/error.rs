//! Error types for regraph-ledger

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the ledger persistence layer
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Reading or writing the backing file failed
    #[error("Ledger I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a ledger
    #[error("Ledger file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// Serialization error
    #[error("Ledger serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record was written for a document that was never marked as started
    #[error("Document not started in ledger: {doc_id}")]
    UnknownDocument { doc_id: String },

    /// The export-time records do not line up with the exported units
    #[error("Ledger records for {doc_id} are misaligned: {records} record(s) for {exported} exported unit(s)")]
    Misaligned {
        doc_id: String,
        records: usize,
        exported: usize,
    },

    /// More unit records exist than the generator reported statuses for
    #[error("Ledger records for {doc_id} overflow generator statuses: {records} record(s), {statuses} status(es)")]
    ReconcileOverflow {
        doc_id: String,
        records: usize,
        statuses: usize,
    },
}

/// Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
