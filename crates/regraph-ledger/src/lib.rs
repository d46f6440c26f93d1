//! Regraph-Ledger: durable result ledger for batch B-Rep graph conversion
//!
//! The ledger maps a document identifier (its source file name) to the
//! ordered list of per-unit result records produced while converting it.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: crash safety. The ledger is persisted after every mutation and an
//! entry is created before any conversion work starts, so a crash leaves
//! evidence of which documents were attempted.
//!
//! ## Key Components
//!
//! - `ResultLedger`: in-memory mapping bound to a `LedgerStore`
//! - `ResultRecord`: one per-unit outcome (`Success`, `Skip`, `Exception`)
//! - `JsonFileStore`: human-diffable JSON file backing with atomic replace
//! - `reconcile`: positional merge of export-time records with generator statuses

mod error;
pub mod fakes;
mod ledger;
mod record;
pub mod reconcile;
pub mod store;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{LedgerSummary, ResultLedger};
pub use reconcile::{reconcile, ExportSlot};
pub use record::{LedgerStatus, ResultRecord, GENERATOR_SUCCESS};
pub use store::{JsonFileStore, LedgerEntries, LedgerStore};
