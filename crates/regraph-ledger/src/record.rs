//! Per-unit result records stored in the ledger.

use serde::{Deserialize, Serialize};

/// Generator status string that marks a unit as converted.
pub const GENERATOR_SUCCESS: &str = "Success";

/// Ledger-side status vocabulary.
///
/// Independent of the generator's own status codes: any generator status
/// other than exactly [`GENERATOR_SUCCESS`] becomes `Skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    Success,
    Skip,
    Exception,
}

impl LedgerStatus {
    /// Translate a generator status into a ledger status.
    pub fn from_generator(status: &str) -> Self {
        if status == GENERATOR_SUCCESS {
            LedgerStatus::Success
        } else {
            LedgerStatus::Skip
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Success => "Success",
            LedgerStatus::Skip => "Skip",
            LedgerStatus::Exception => "Exception",
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One per-unit outcome.
///
/// Export-time records carry only `file`; reconciliation fills in `status`
/// and `reason` afterwards. Absent fields are omitted from the JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LedgerStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Error kind for `Exception` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_args: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,

    /// File name (not path) of the exported graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ResultRecord {
    /// Record for a graph file that was confirmed on disk.
    pub fn exported(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Default::default()
        }
    }

    /// Record for a design the generator reported as unsupported.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: Some(LedgerStatus::Skip),
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Record built from a generator status; the raw status is kept as `reason`.
    pub fn from_generator(status: &str) -> Self {
        Self {
            status: Some(LedgerStatus::from_generator(status)),
            reason: Some(status.to_string()),
            ..Default::default()
        }
    }

    /// Record for a failure caught by the document-level guard.
    pub fn exception(
        kind: impl Into<String>,
        args: impl Into<String>,
        trace: impl Into<String>,
    ) -> Self {
        Self {
            status: Some(LedgerStatus::Exception),
            exception: Some(kind.into()),
            exception_args: Some(args.into()),
            trace: Some(trace.into()),
            ..Default::default()
        }
    }

    /// Overwrite `status`/`reason` from a generator status, leaving other fields intact.
    pub fn apply_generator_status(&mut self, status: &str) {
        self.status = Some(LedgerStatus::from_generator(status));
        self.reason = Some(status.to_string());
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(LedgerStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_success_status_becomes_skip() {
        assert_eq!(LedgerStatus::from_generator("Success"), LedgerStatus::Success);
        assert_eq!(LedgerStatus::from_generator("success"), LedgerStatus::Skip);
        assert_eq!(
            LedgerStatus::from_generator("UnsupportedFeature"),
            LedgerStatus::Skip
        );
    }

    #[test]
    fn test_exported_record_serializes_file_only() {
        let record = ResultRecord::exported("Couch_0000.json");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, serde_json::json!({ "file": "Couch_0000.json" }));
    }

    #[test]
    fn test_apply_status_keeps_file() {
        let mut record = ResultRecord::exported("Couch_0001.json");
        record.apply_generator_status("Empty face");

        assert_eq!(record.status, Some(LedgerStatus::Skip));
        assert_eq!(record.reason.as_deref(), Some("Empty face"));
        assert_eq!(record.file.as_deref(), Some("Couch_0001.json"));
    }

    #[test]
    fn test_exception_record_shape() {
        let record = ResultRecord::exception("Import", "bad sketch", "stage: imported");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "Exception");
        assert_eq!(value["exception"], "Import");
        assert_eq!(value["exception_args"], "bad sketch");
        assert!(value.get("file").is_none());
    }

    #[test]
    fn test_record_parses_without_optional_fields() {
        let record: ResultRecord = serde_json::from_str(r#"{"status":"Skip"}"#).unwrap();
        assert_eq!(record.status, Some(LedgerStatus::Skip));
        assert!(record.reason.is_none());
    }
}
