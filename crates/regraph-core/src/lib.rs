//! Regraph Core Library
//!
//! Resumable batch conversion of CAD reconstruction histories into B-Rep
//! topology graphs. Re-exports the converter, batch driver, collaborator
//! traits and supporting types.

pub mod batch;
pub mod collaborators;
pub mod config;
pub mod converter;
pub mod document;
pub mod error;
pub mod fakes;
pub mod graph;
pub mod mode;
pub mod obs;
pub mod paths;
pub mod startup;
pub mod telemetry;

pub use batch::{BatchDriver, BatchReport};

pub use collaborators::{
    to_pretty_json, Collaborators, DesignHost, DesignImporter, GraphGenerator, GraphValidator,
    GraphWriter, JsonGraphWriter, ModelHandle,
};

pub use config::{RegraphConfig, ToolchainConfig, DEFAULT_CONFIG_FILE};

pub use converter::{ConversionOutcome, ConversionStage, DocumentConverter, StageFailure};

pub use document::{discover_documents, Document, DocumentSource};

pub use error::{RegraphError, Result};

pub use graph::{Graph, GraphData, Sequence, SupportVerdict, UnitStatus};

pub use mode::ConversionMode;

pub use paths::{document_stem, ExportPaths, UnitLabel};

pub use startup::{run_when_ready, ReadyAction, StartupHandshake, StartupState};

pub use regraph_ledger::{
    JsonFileStore, LedgerError, LedgerStatus, LedgerStore, LedgerSummary, ResultLedger,
    ResultRecord,
};
