//! Error types for regraph-core

use std::path::PathBuf;

use regraph_ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegraphError {
    #[error("Failed to read document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document {path} is not valid JSON: {message}")]
    DocumentParse { path: PathBuf, message: String },

    #[error("Invalid document path: {0}")]
    InvalidDocumentPath(PathBuf),

    #[error("Design import failed: {0}")]
    Import(String),

    #[error("Graph generation failed: {0}")]
    Generation(String),

    #[error("Graph validation failed: {0}")]
    Validation(String),

    #[error("Graph reconstruction failed: {0}")]
    Reconstruction(String),

    #[error("Sequence annotation failed: {0}")]
    Annotation(String),

    #[error("Failed to export {path}: {message}")]
    Export { path: PathBuf, message: String },

    #[error("Host error: {0}")]
    Host(String),

    #[error("Toolchain command failed: {0}")]
    Toolchain(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document discovery failed: {0}")]
    Discovery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl RegraphError {
    /// Stable kind name recorded as `exception` in ledger records.
    pub fn kind(&self) -> &'static str {
        match self {
            RegraphError::DocumentRead { .. } => "DocumentRead",
            RegraphError::DocumentParse { .. } => "DocumentParse",
            RegraphError::InvalidDocumentPath(_) => "InvalidDocumentPath",
            RegraphError::Import(_) => "Import",
            RegraphError::Generation(_) => "Generation",
            RegraphError::Validation(_) => "Validation",
            RegraphError::Reconstruction(_) => "Reconstruction",
            RegraphError::Annotation(_) => "Annotation",
            RegraphError::Export { .. } => "Export",
            RegraphError::Host(_) => "Host",
            RegraphError::Toolchain(_) => "Toolchain",
            RegraphError::Config(_) => "Config",
            RegraphError::Discovery(_) => "Discovery",
            RegraphError::Serialization(_) => "Serialization",
            RegraphError::Ledger(LedgerError::ReconcileOverflow { .. }) => "ReconcileOverflow",
            RegraphError::Ledger(_) => "Ledger",
        }
    }

    /// The error's arguments joined by spaces, without the kind prefix.
    ///
    /// Recorded as `exception_args` in ledger records.
    pub fn args(&self) -> String {
        match self {
            RegraphError::DocumentRead { path, source } => {
                format!("{} {}", path.display(), source)
            }
            RegraphError::DocumentParse { path, message }
            | RegraphError::Export { path, message } => format!("{} {}", path.display(), message),
            RegraphError::InvalidDocumentPath(path) => path.display().to_string(),
            RegraphError::Import(message)
            | RegraphError::Generation(message)
            | RegraphError::Validation(message)
            | RegraphError::Reconstruction(message)
            | RegraphError::Annotation(message)
            | RegraphError::Host(message)
            | RegraphError::Toolchain(message)
            | RegraphError::Config(message)
            | RegraphError::Discovery(message) => message.clone(),
            RegraphError::Serialization(e) => e.to_string(),
            RegraphError::Ledger(e) => e.to_string(),
        }
    }
}

/// Result type for regraph-core operations
pub type Result<T> = std::result::Result<T, RegraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(RegraphError::Import("x".into()).kind(), "Import");
        let overflow = RegraphError::from(LedgerError::ReconcileOverflow {
            doc_id: "Bed.json".into(),
            records: 2,
            statuses: 1,
        });
        assert_eq!(overflow.kind(), "ReconcileOverflow");
    }

    #[test]
    fn test_args_drop_kind_prefix() {
        assert_eq!(RegraphError::Import("profile not closed".into()).args(), "profile not closed");
        let export = RegraphError::Export {
            path: PathBuf::from("out/Bed_0001.json"),
            message: "disk full".into(),
        };
        assert_eq!(export.args(), "out/Bed_0001.json disk full");
    }

    #[test]
    fn test_display_includes_message() {
        let err = RegraphError::Generation("no bodies".into());
        assert_eq!(err.to_string(), "Graph generation failed: no bodies");
    }
}
