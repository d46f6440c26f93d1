//! Single-document conversion and result recording.
//!
//! One call to [`DocumentConverter::convert`] walks a document through
//! support check, import, generation, annotation, validation, export and
//! status reconciliation, recording every step in the ledger as it goes.
//! Collaborator failures never escape: they become an `Exception` record.
//! Only a ledger that cannot be persisted is reported to the caller.

use std::path::{Path, PathBuf};

use regraph_ledger::{ExportSlot, LedgerError, ResultLedger, ResultRecord};
use tracing::{debug, error, info};

use crate::collaborators::{Collaborators, ModelHandle};
use crate::document::{Document, DocumentSource};
use crate::error::RegraphError;
use crate::graph::{GraphData, Sequence};
use crate::mode::ConversionMode;
use crate::obs;
use crate::paths::{ExportPaths, UnitLabel};

/// Pipeline position of a document.
///
/// The stage reached when a failure happens is recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionStage {
    Init,
    SupportChecked,
    Skipped,
    Imported,
    Generated,
    Annotated,
    Validated,
    Reconstructed,
    Exported,
    Reconciled,
}

impl ConversionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStage::Init => "init",
            ConversionStage::SupportChecked => "support_checked",
            ConversionStage::Skipped => "skipped",
            ConversionStage::Imported => "imported",
            ConversionStage::Generated => "generated",
            ConversionStage::Annotated => "annotated",
            ConversionStage::Validated => "validated",
            ConversionStage::Reconstructed => "reconstructed",
            ConversionStage::Exported => "exported",
            ConversionStage::Reconciled => "reconciled",
        }
    }
}

impl std::fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure caught by the document-level guard.
#[derive(Debug)]
pub struct StageFailure {
    /// Last stage completed before the failure.
    pub stage: ConversionStage,
    pub error: RegraphError,
}

impl StageFailure {
    /// Stage followed by the error and its full source chain.
    pub fn trace(&self) -> String {
        let mut trace = format!("after stage '{}': {}", self.stage, self.error);
        let mut source = std::error::Error::source(&self.error);
        while let Some(cause) = source {
            trace.push_str(&format!("\ncaused by: {}", cause));
            source = cause.source();
        }
        trace
    }

    pub fn to_record(&self) -> ResultRecord {
        ResultRecord::exception(self.error.kind(), self.error.args(), self.trace())
    }
}

/// How one document ended.
#[derive(Debug)]
pub enum ConversionOutcome {
    /// The pipeline reached reconciliation.
    Converted {
        /// Graphs the generator produced.
        graphs: usize,
        /// Graph files confirmed on disk.
        exported: usize,
    },
    /// Unsupported in `PerFace` mode; nothing was imported.
    Unsupported { reason: String },
    /// A collaborator or pipeline step failed; an `Exception` record was written.
    Failed(StageFailure),
}

impl ConversionOutcome {
    /// Counts toward the batch success total.
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Converted { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversionOutcome::Converted { .. } => "converted",
            ConversionOutcome::Unsupported { .. } => "unsupported",
            ConversionOutcome::Failed(_) => "failed",
        }
    }
}

enum PipelineEnd {
    Skipped(String),
    Converted { graphs: usize, exported: usize },
}

/// Converts one document at a time into graph files and ledger records.
#[derive(Clone)]
pub struct DocumentConverter {
    mode: ConversionMode,
    output_dir: PathBuf,
    collaborators: Collaborators,
}

impl DocumentConverter {
    pub fn new(
        mode: ConversionMode,
        output_dir: impl Into<PathBuf>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            mode,
            output_dir: output_dir.into(),
            collaborators,
        }
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert `source` using `model`, recording results under its identifier.
    ///
    /// The ledger entry is created and persisted before any other work.
    /// Returns `Err` only when the ledger itself cannot be written.
    pub async fn convert(
        &self,
        source: &DocumentSource,
        model: &ModelHandle,
        ledger: &mut ResultLedger,
    ) -> Result<ConversionOutcome, LedgerError> {
        ledger.mark_started(&source.id)?;

        let mut stage = ConversionStage::Init;
        let result = self.run_stages(source, model, ledger, &mut stage).await;

        let outcome = match result {
            Ok(PipelineEnd::Skipped(reason)) => {
                info!(doc_id = %source.id, reason = %reason, "Design not supported, skipping");
                ledger.append(&source.id, ResultRecord::skipped(reason.clone()))?;
                ConversionOutcome::Unsupported { reason }
            }
            Ok(PipelineEnd::Converted { graphs, exported }) => {
                ConversionOutcome::Converted { graphs, exported }
            }
            Err(error) => {
                let failure = StageFailure { stage, error };
                error!(
                    doc_id = %source.id,
                    stage = %failure.stage,
                    exception = failure.error.kind(),
                    "Exception: {}",
                    failure.error
                );
                ledger.append(&source.id, failure.to_record())?;
                ConversionOutcome::Failed(failure)
            }
        };

        obs::emit_document_finished(&source.id, outcome.label(), outcome.is_success());
        Ok(outcome)
    }

    async fn run_stages(
        &self,
        source: &DocumentSource,
        model: &ModelHandle,
        ledger: &mut ResultLedger,
        stage: &mut ConversionStage,
    ) -> Result<PipelineEnd, RegraphError> {
        let c = &self.collaborators;
        let paths = ExportPaths::new(&self.output_dir, &source.id);

        let document = Document::load(source).await?;

        let verdict = c.generator.is_design_supported(&document, self.mode).await?;
        *stage = ConversionStage::SupportChecked;
        if !verdict.supported {
            if self.mode.skips_unsupported() {
                *stage = ConversionStage::Skipped;
                return Ok(PipelineEnd::Skipped(verdict.reason));
            }
            info!(
                doc_id = %source.id,
                reason = %verdict.reason,
                "Design not fully supported, attempting {} conversion anyway",
                self.mode
            );
        }

        c.importer.reconstruct(&document, model).await?;
        *stage = ConversionStage::Imported;

        let mut data = c.generator.generate(model, self.mode).await?;
        *stage = ConversionStage::Generated;
        debug!(
            doc_id = %source.id,
            graphs = data.graphs.len(),
            statuses = data.status.len(),
            "Generated graphs"
        );

        let mut slots = Vec::new();
        if !data.is_empty() {
            if self.mode.uses_sequence() {
                annotate_sequence(&mut data, &paths)?;
                *stage = ConversionStage::Annotated;
            }

            c.validator.validate(&data, self.mode).await?;
            *stage = ConversionStage::Validated;

            if self.mode.uses_sequence() {
                c.validator.reconstruct_from_graph(&data).await?;
                *stage = ConversionStage::Reconstructed;
            }

            slots = self.export_graphs(&source.id, &data, &paths, ledger).await?;
            if self.mode.uses_sequence() {
                if let Some(sequence) = data.primary_sequence() {
                    self.export_sequence(sequence, &paths).await?;
                }
            }
            *stage = ConversionStage::Exported;
        }

        ledger.reconcile(&source.id, &slots, &data.status)?;
        *stage = ConversionStage::Reconciled;

        let exported = slots
            .iter()
            .filter(|s| matches!(s, ExportSlot::Written(_)))
            .count();
        Ok(PipelineEnd::Converted {
            graphs: data.graphs.len(),
            exported,
        })
    }

    /// Write every graph, crediting the ledger only for files that exist afterwards.
    async fn export_graphs(
        &self,
        doc_id: &str,
        data: &GraphData,
        paths: &ExportPaths,
        ledger: &mut ResultLedger,
    ) -> Result<Vec<ExportSlot>, RegraphError> {
        let mut slots = Vec::with_capacity(data.graphs.len());
        for (index, graph) in data.graphs.iter().enumerate() {
            let path = paths.graph(index);
            let file_name = paths.file_name(UnitLabel::Index(index));
            obs::emit_unit_exporting(&path.display().to_string());

            self.collaborators.writer.write_json(&path, &graph.0).await?;

            if file_exists(&path).await {
                obs::emit_unit_exported(&path.display().to_string());
                ledger.append(doc_id, ResultRecord::exported(file_name.clone()))?;
                slots.push(ExportSlot::Written(file_name));
            } else {
                obs::emit_export_gap(&path.display().to_string());
                slots.push(ExportSlot::Missing(file_name));
            }
        }
        Ok(slots)
    }

    /// The sequence file is not tracked in the ledger.
    async fn export_sequence(
        &self,
        sequence: &Sequence,
        paths: &ExportPaths,
    ) -> Result<(), RegraphError> {
        let path = paths.sequence();
        let value = serde_json::Value::Object(sequence.0.clone());
        self.collaborators.writer.write_json(&path, &value).await?;
        debug!(path = %path.display(), "Exported sequence");
        Ok(())
    }
}

/// Record each graph's file name on the matching step of the first sequence.
fn annotate_sequence(data: &mut GraphData, paths: &ExportPaths) -> Result<(), RegraphError> {
    let graph_files: Vec<String> = (0..data.graphs.len())
        .map(|index| paths.file_name(UnitLabel::Index(index)))
        .collect();
    data.primary_sequence_mut()?.annotate(&graph_files)
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
