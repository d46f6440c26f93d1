//! Collaborator traits the conversion pipeline is sequenced over.
//!
//! - `DesignHost`: hands out and releases per-document model handles
//! - `DesignImporter`: rebuilds a solid model from a document
//! - `GraphGenerator`: support predicate and graph generation
//! - `GraphValidator`: structural checks and graph round-trip
//! - `GraphWriter`: serializes graphs and sequences to disk
//!
//! All traits are async and backend-agnostic. Scripted fakes live in
//! [`crate::fakes`]; the process-backed implementation is in
//! `regraph-toolchain`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::document::Document;
use crate::error::{RegraphError, Result};
use crate::graph::{GraphData, SupportVerdict};
use crate::mode::ConversionMode;

/// Opaque handle to a live model in the host environment.
///
/// Obtained from [`DesignHost::open_model`] for exactly one document and
/// given back through [`DesignHost::close_model`]. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    id: Uuid,
    document: String,
    workspace: Option<PathBuf>,
}

impl ModelHandle {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.into(),
            workspace: None,
        }
    }

    /// Handle backed by a scratch directory owned by the host.
    pub fn with_workspace(document: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: Some(workspace.into()),
            ..Self::new(document)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the document this model was opened for.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }
}

/// The environment that owns live models.
#[async_trait]
pub trait DesignHost: Send + Sync {
    /// Open a fresh model for `doc_id`.
    async fn open_model(&self, doc_id: &str) -> Result<ModelHandle>;

    /// Release a model so the host can move on to the next document.
    async fn close_model(&self, model: ModelHandle) -> Result<()>;
}

/// Rebuilds a solid model from a reconstruction history.
#[async_trait]
pub trait DesignImporter: Send + Sync {
    async fn reconstruct(&self, document: &Document, model: &ModelHandle) -> Result<()>;
}

/// Inspects documents and reconstructed models to produce graphs.
#[async_trait]
pub trait GraphGenerator: Send + Sync {
    /// Cheap check against the raw document, before any import.
    async fn is_design_supported(
        &self,
        document: &Document,
        mode: ConversionMode,
    ) -> Result<SupportVerdict>;

    async fn generate(&self, model: &ModelHandle, mode: ConversionMode) -> Result<GraphData>;
}

/// Checks generated graphs.
#[async_trait]
pub trait GraphValidator: Send + Sync {
    /// Structural checks on every graph. Must fail loudly, never pass silently.
    async fn validate(&self, data: &GraphData, mode: ConversionMode) -> Result<()>;

    /// Rebuild geometry from the annotated graph set (`PerFace` only).
    async fn reconstruct_from_graph(&self, data: &GraphData) -> Result<()>;
}

/// Serializes pipeline output to disk.
///
/// Returning `Ok` does not promise the file exists; the pipeline checks.
#[async_trait]
pub trait GraphWriter: Send + Sync {
    async fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()>;
}

/// Writes pretty-printed JSON with `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct JsonGraphWriter;

#[async_trait]
impl GraphWriter for JsonGraphWriter {
    async fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()> {
        let bytes = to_pretty_json(value)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| RegraphError::Export {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Four-space indented JSON, matching the ledger file.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// The collaborators one converter drives.
#[derive(Clone)]
pub struct Collaborators {
    pub importer: Arc<dyn DesignImporter>,
    pub generator: Arc<dyn GraphGenerator>,
    pub validator: Arc<dyn GraphValidator>,
    pub writer: Arc<dyn GraphWriter>,
}

impl Collaborators {
    /// All four roles served by one toolchain, writing with [`JsonGraphWriter`].
    pub fn from_toolchain<T>(toolchain: Arc<T>) -> Self
    where
        T: DesignImporter + GraphGenerator + GraphValidator + 'static,
    {
        Self {
            importer: toolchain.clone(),
            generator: toolchain.clone(),
            validator: toolchain,
            writer: Arc::new(JsonGraphWriter),
        }
    }

    pub fn with_writer(mut self, writer: Arc<dyn GraphWriter>) -> Self {
        self.writer = writer;
        self
    }
}
