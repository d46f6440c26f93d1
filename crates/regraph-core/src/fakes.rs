//! Scripted collaborator fakes (testing only)
//!
//! `ScriptedToolchain` answers every importer, generator and validator call
//! from a per-document script and records what it was asked. `RecordingHost`
//! hands out model handles and remembers which were released.
//! `RecordingWriter` writes real files but can be told to silently drop some.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::collaborators::{
    DesignHost, DesignImporter, GraphGenerator, GraphValidator, GraphWriter, JsonGraphWriter,
    ModelHandle,
};
use crate::document::Document;
use crate::error::{RegraphError, Result};
use crate::graph::{Graph, GraphData, Sequence, SupportVerdict, UnitStatus};
use crate::mode::ConversionMode;

// ---------------------------------------------------------------------------
// ScriptedToolchain
// ---------------------------------------------------------------------------

/// Collaborator step a script can fail or panic at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptedStep {
    Support,
    Import,
    Generate,
    Validate,
    ReconstructFromGraph,
}

/// How the toolchain behaves for one document.
#[derive(Debug, Clone)]
pub struct ScriptedDesign {
    pub verdict: SupportVerdict,
    pub output: GraphData,
    pub fail_at: Option<(ScriptedStep, String)>,
    pub panic_at: Option<ScriptedStep>,
}

impl Default for ScriptedDesign {
    fn default() -> Self {
        Self {
            verdict: SupportVerdict::supported(),
            output: GraphData::default(),
            fail_at: None,
            panic_at: None,
        }
    }
}

impl ScriptedDesign {
    /// Supported design yielding `graphs` graphs, each with status `Success`,
    /// and one sequence with a step per graph.
    pub fn with_graphs(graphs: usize) -> Self {
        Self::default().output(graph_data(graphs, &vec!["Success"; graphs], graphs))
    }

    pub fn unsupported(reason: &str) -> Self {
        Self {
            verdict: SupportVerdict::unsupported(reason),
            ..Self::default()
        }
    }

    pub fn output(mut self, output: GraphData) -> Self {
        self.output = output;
        self
    }

    pub fn fail_at(mut self, step: ScriptedStep, message: &str) -> Self {
        self.fail_at = Some((step, message.to_string()));
        self
    }

    pub fn panic_at(mut self, step: ScriptedStep) -> Self {
        self.panic_at = Some(step);
        self
    }
}

/// `graphs` placeholder graphs, the given statuses and one sequence of `steps` steps.
pub fn graph_data(graphs: usize, statuses: &[&str], steps: usize) -> GraphData {
    GraphData {
        graphs: (0..graphs)
            .map(|i| {
                Graph(serde_json::json!({ "directed": false, "nodes": [], "links": [], "unit": i }))
            })
            .collect(),
        sequences: vec![Sequence::with_steps(
            (0..steps)
                .map(|i| serde_json::json!({ "action": "extrude", "step": i }))
                .collect(),
        )],
        status: statuses.iter().map(|s| UnitStatus::new(*s)).collect(),
    }
}

/// One call the toolchain received, tagged with the document it concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainCall {
    Support(String),
    Import(String),
    Generate(String),
    Validate(String),
    ReconstructFromGraph(String),
}

/// In-memory importer, generator and validator driven by per-document scripts.
///
/// Documents without a script are supported and generate nothing.
#[derive(Debug, Default)]
pub struct ScriptedToolchain {
    scripts: HashMap<String, ScriptedDesign>,
    calls: Mutex<Vec<ToolchainCall>>,
    validated: Mutex<Vec<GraphData>>,
    current: Mutex<Option<String>>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, doc_id: &str, design: ScriptedDesign) -> Self {
        self.scripts.insert(doc_id.to_string(), design);
        self
    }

    pub fn calls(&self) -> Vec<ToolchainCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made for `doc_id`, in order.
    pub fn calls_for(&self, doc_id: &str) -> Vec<ToolchainCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.doc_id() == doc_id)
            .collect()
    }

    /// Graph data exactly as the validator received it.
    pub fn validated(&self) -> Vec<GraphData> {
        self.validated.lock().unwrap().clone()
    }

    fn design(&self, doc_id: &str) -> ScriptedDesign {
        self.scripts.get(doc_id).cloned().unwrap_or_default()
    }

    fn current_document(&self) -> String {
        self.current.lock().unwrap().clone().unwrap_or_default()
    }

    /// Record the call, then fail or panic if the script says so.
    fn step(&self, step: ScriptedStep, call: ToolchainCall) -> Result<ScriptedDesign> {
        let doc_id = call.doc_id().to_string();
        self.calls.lock().unwrap().push(call);
        let design = self.design(&doc_id);

        if design.panic_at == Some(step) {
            panic!("scripted panic at {:?} for {}", step, doc_id);
        }
        match &design.fail_at {
            Some((failing, message)) if *failing == step => Err(scripted_error(step, message)),
            _ => Ok(design),
        }
    }
}

impl ToolchainCall {
    pub fn doc_id(&self) -> &str {
        match self {
            ToolchainCall::Support(d)
            | ToolchainCall::Import(d)
            | ToolchainCall::Generate(d)
            | ToolchainCall::Validate(d)
            | ToolchainCall::ReconstructFromGraph(d) => d,
        }
    }
}

fn scripted_error(step: ScriptedStep, message: &str) -> RegraphError {
    let message = message.to_string();
    match step {
        ScriptedStep::Support | ScriptedStep::Generate => RegraphError::Generation(message),
        ScriptedStep::Import => RegraphError::Import(message),
        ScriptedStep::Validate => RegraphError::Validation(message),
        ScriptedStep::ReconstructFromGraph => RegraphError::Reconstruction(message),
    }
}

#[async_trait]
impl DesignImporter for ScriptedToolchain {
    async fn reconstruct(&self, document: &Document, _model: &ModelHandle) -> Result<()> {
        self.step(ScriptedStep::Import, ToolchainCall::Import(document.id().to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl GraphGenerator for ScriptedToolchain {
    async fn is_design_supported(
        &self,
        document: &Document,
        _mode: ConversionMode,
    ) -> Result<SupportVerdict> {
        *self.current.lock().unwrap() = Some(document.id().to_string());
        let design = self.step(
            ScriptedStep::Support,
            ToolchainCall::Support(document.id().to_string()),
        )?;
        Ok(design.verdict)
    }

    async fn generate(&self, model: &ModelHandle, _mode: ConversionMode) -> Result<GraphData> {
        let design = self.step(
            ScriptedStep::Generate,
            ToolchainCall::Generate(model.document().to_string()),
        )?;
        Ok(design.output)
    }
}

#[async_trait]
impl GraphValidator for ScriptedToolchain {
    async fn validate(&self, data: &GraphData, _mode: ConversionMode) -> Result<()> {
        self.validated.lock().unwrap().push(data.clone());
        self.step(
            ScriptedStep::Validate,
            ToolchainCall::Validate(self.current_document()),
        )?;
        Ok(())
    }

    async fn reconstruct_from_graph(&self, _data: &GraphData) -> Result<()> {
        self.step(
            ScriptedStep::ReconstructFromGraph,
            ToolchainCall::ReconstructFromGraph(self.current_document()),
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

/// Host that tracks every model it opens and releases.
#[derive(Debug, Default)]
pub struct RecordingHost {
    opened: Mutex<Vec<ModelHandle>>,
    closed: Mutex<Vec<Uuid>>,
    refuse: HashSet<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open_model` fail for `doc_id`.
    pub fn refuse(mut self, doc_id: &str) -> Self {
        self.refuse.insert(doc_id.to_string());
        self
    }

    /// Documents a model was opened for, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.document().to_string())
            .collect()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.lock().unwrap().len()
    }

    /// Every opened model has been closed.
    pub fn all_released(&self) -> bool {
        let closed = self.closed.lock().unwrap();
        self.opened
            .lock()
            .unwrap()
            .iter()
            .all(|m| closed.contains(&m.id()))
    }
}

#[async_trait]
impl DesignHost for RecordingHost {
    async fn open_model(&self, doc_id: &str) -> Result<ModelHandle> {
        if self.refuse.contains(doc_id) {
            return Err(RegraphError::Host(format!("cannot open a model for {}", doc_id)));
        }
        let model = ModelHandle::new(doc_id);
        self.opened.lock().unwrap().push(model.clone());
        Ok(model)
    }

    async fn close_model(&self, model: ModelHandle) -> Result<()> {
        self.closed.lock().unwrap().push(model.id());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingWriter
// ---------------------------------------------------------------------------

/// JSON writer that records every write and silently drops chosen files.
///
/// A dropped file still returns `Ok`, which is what an export gap looks like.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    drop_files: HashSet<String>,
    writes: Mutex<Vec<PathBuf>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend to write `file_name` but leave nothing on disk.
    pub fn dropping(mut self, file_name: &str) -> Self {
        self.drop_files.insert(file_name.to_string());
        self
    }

    /// Every path a write was requested for, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphWriter for RecordingWriter {
    async fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()> {
        self.writes.lock().unwrap().push(path.to_path_buf());
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.drop_files.contains(name) {
            return Ok(());
        }
        JsonGraphWriter.write_json(path, value).await
    }
}
