//! Structured observability hooks for the batch and per-document lifecycle.
//!
//! Events are emitted at `info!` (gaps and failures at `warn!`/`error!`)
//! with a stable `event` field so JSON log output can be filtered.

use tracing::{debug, error, info, warn};

/// Span tagging every log line of one document with its identifier.
///
/// ```ignore
/// convert(doc).instrument(document_span("Couch.json")).await;
/// ```
pub fn document_span(doc_id: &str) -> tracing::Span {
    tracing::info_span!("regraph.document", doc_id = %doc_id)
}

pub fn emit_batch_started(total: usize, mode: &str, ledger: &str) {
    info!(event = "batch.started", total = total, mode = %mode, ledger = %ledger);
}

/// `[index/total] Skipping <path>` for documents already in the ledger.
pub fn emit_document_skipped(index: usize, total: usize, path: &str) {
    info!(event = "document.skipped", "[{}/{}] Skipping {}", index, total, path);
}

/// `[index/total] Processing <path>`.
pub fn emit_document_processing(index: usize, total: usize, path: &str) {
    info!(event = "document.processing", "[{}/{}] Processing {}", index, total, path);
}

pub fn emit_document_finished(doc_id: &str, outcome: &str, success: bool) {
    info!(event = "document.finished", doc_id = %doc_id, outcome = %outcome, success = success);
}

pub fn emit_unit_exporting(path: &str) {
    info!(event = "unit.exporting", "Exporting {}", path);
}

/// The graph file is confirmed on disk.
pub fn emit_unit_exported(path: &str) {
    debug!(event = "unit.exported", "Exported {}", path);
}

/// A graph write returned but the file is not on disk.
pub fn emit_export_gap(path: &str) {
    warn!(event = "unit.export_gap", "Error exporting {}", path);
}

/// Failure that escaped the document-level guard.
pub fn emit_document_error(doc_id: &str, error: &dyn std::fmt::Display) {
    error!(event = "document.error", doc_id = %doc_id, "Error exporting: {}", error);
}

/// `[success/total] designs processed successfully`.
pub fn emit_batch_finished(success: usize, total: usize, duration_ms: u64) {
    info!("----------------------------");
    info!(
        event = "batch.finished",
        duration_ms = duration_ms,
        "[{}/{}] designs processed successfully",
        success,
        total
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_span_create() {
        let _entered = document_span("Couch.json").entered();
        emit_document_processing(1, 1, "Couch.json");
    }
}
