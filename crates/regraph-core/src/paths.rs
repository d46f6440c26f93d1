//! Export path resolution.
//!
//! Every output file of a document shares the document's stem:
//! `{stem}_{0000}.json` for unit graphs and `{stem}_sequence.json` for the
//! annotated sequence.

use std::path::{Path, PathBuf};

/// Extension of every exported file.
pub const EXPORT_EXTENSION: &str = "json";

/// Label distinguishing files exported for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitLabel {
    /// Graph for the unit at this index, zero-padded to four digits.
    Index(usize),
    /// Sequence file (`PerFace` only).
    Sequence,
}

impl std::fmt::Display for UnitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitLabel::Index(index) => write!(f, "{:04}", index),
            UnitLabel::Sequence => f.write_str("sequence"),
        }
    }
}

/// File stem of a document identifier (`Couch.json` -> `Couch`).
pub fn document_stem(doc_id: &str) -> &str {
    Path::new(doc_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(doc_id)
}

/// Resolves output paths for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    output_dir: PathBuf,
    stem: String,
}

impl ExportPaths {
    pub fn new(output_dir: impl Into<PathBuf>, doc_id: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            stem: document_stem(doc_id).to_string(),
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// File name for `label`, without directory.
    pub fn file_name(&self, label: UnitLabel) -> String {
        format!("{}_{}.{}", self.stem, label, EXPORT_EXTENSION)
    }

    pub fn resolve(&self, label: UnitLabel) -> PathBuf {
        self.output_dir.join(self.file_name(label))
    }

    pub fn graph(&self, index: usize) -> PathBuf {
        self.resolve(UnitLabel::Index(index))
    }

    pub fn sequence(&self) -> PathBuf {
        self.resolve(UnitLabel::Sequence)
    }
}
