//! Batch driver: walks the document list, skips what the ledger already
//! holds, converts the rest one at a time and always releases each model.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use regraph_ledger::ResultLedger;
use serde::Serialize;
use tracing::{warn, Instrument};

use crate::collaborators::DesignHost;
use crate::converter::{ConversionOutcome, DocumentConverter};
use crate::document::DocumentSource;
use crate::obs;

/// Totals for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Documents in the input list.
    pub total: usize,
    /// Already present in the ledger and left alone.
    pub skipped_existing: usize,
    /// Handed to the converter.
    pub processed: usize,
    /// Reached reconciliation.
    pub succeeded: usize,
    /// Reported unsupported and skipped before import.
    pub unsupported: usize,
    /// Ended in an exception record or a driver-level error.
    pub failed: usize,
    pub duration_ms: u64,
}

/// Runs the converter over a list of documents, one after another.
pub struct BatchDriver {
    converter: DocumentConverter,
    host: Arc<dyn DesignHost>,
}

impl BatchDriver {
    pub fn new(converter: DocumentConverter, host: Arc<dyn DesignHost>) -> Self {
        Self { converter, host }
    }

    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    /// Convert every document not yet in `ledger`, in listed order.
    ///
    /// Never fails: per-document problems are logged and counted.
    pub async fn run(&self, documents: &[PathBuf], ledger: &mut ResultLedger) -> BatchReport {
        let start = Instant::now();
        let total = documents.len();
        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        obs::emit_batch_started(total, self.converter.mode().as_str(), &ledger.location());

        for (i, path) in documents.iter().enumerate() {
            let index = i + 1;
            let shown = path.display().to_string();

            let source = match DocumentSource::from_path(path) {
                Ok(source) => source,
                Err(e) => {
                    obs::emit_document_error(&shown, &e);
                    report.failed += 1;
                    continue;
                }
            };

            if ledger.has(&source.id) {
                obs::emit_document_skipped(index, total, &shown);
                report.skipped_existing += 1;
                continue;
            }

            obs::emit_document_processing(index, total, &shown);
            report.processed += 1;

            let span = obs::document_span(&source.id);
            match self.process(&source, ledger).instrument(span).await {
                Some(ConversionOutcome::Converted { .. }) => report.succeeded += 1,
                Some(ConversionOutcome::Unsupported { .. }) => report.unsupported += 1,
                Some(ConversionOutcome::Failed(_)) | None => report.failed += 1,
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_batch_finished(report.succeeded, report.total, report.duration_ms);
        report
    }

    /// Open a model, convert, and release the model whatever happened.
    ///
    /// `None` means the failure escaped the converter (host error, ledger
    /// write failure or panic) and was logged here.
    async fn process(
        &self,
        source: &DocumentSource,
        ledger: &mut ResultLedger,
    ) -> Option<ConversionOutcome> {
        let model = match self.host.open_model(&source.id).await {
            Ok(model) => model,
            Err(e) => {
                obs::emit_document_error(&source.id, &e);
                return None;
            }
        };

        let converted = AssertUnwindSafe(self.converter.convert(source, &model, ledger))
            .catch_unwind()
            .await;

        if let Err(e) = self.host.close_model(model).await {
            warn!(doc_id = %source.id, error = %e, "Failed to release model");
        }

        match converted {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                obs::emit_document_error(&source.id, &e);
                None
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                obs::emit_document_error(&source.id, &format!("panic: {}", message));
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
