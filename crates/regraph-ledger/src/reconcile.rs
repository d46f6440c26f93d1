//! Positional merge of export-time records with generator statuses.
//!
//! Export appends one `{file}` record per graph confirmed on disk, so the
//! record list can be shorter than the unit list when a write left no file.
//! Before merging, records are put back at their unit position and every
//! missing unit gets a gap placeholder. The merge then walks the generator
//! statuses by index: an existing record has `status`/`reason` overwritten
//! in place, a missing one is appended.

use crate::error::{LedgerError, LedgerResult};
use crate::record::{LedgerStatus, ResultRecord};

/// Export outcome of one graph unit, in unit index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSlot {
    /// The graph file was confirmed on disk; its record is in the ledger.
    Written(String),
    /// The write returned but no file appeared.
    Missing(String),
}

enum Aligned {
    Record(ResultRecord),
    Gap(String),
}

/// Merge `statuses` into `records`, returning the unit-aligned list.
///
/// `records` must hold exactly one record per [`ExportSlot::Written`] slot,
/// in slot order. A unit list longer than `statuses` is an invariant
/// violation and is reported, not truncated.
pub fn reconcile<S: AsRef<str>>(
    doc_id: &str,
    records: Vec<ResultRecord>,
    slots: &[ExportSlot],
    statuses: &[S],
) -> LedgerResult<Vec<ResultRecord>> {
    let written = slots
        .iter()
        .filter(|s| matches!(s, ExportSlot::Written(_)))
        .count();
    if records.len() != written {
        return Err(LedgerError::Misaligned {
            doc_id: doc_id.to_string(),
            records: records.len(),
            exported: written,
        });
    }

    let mut pending = records.into_iter();
    let mut aligned = Vec::with_capacity(slots.len().max(statuses.len()));
    for slot in slots {
        match slot {
            // Count checked above.
            ExportSlot::Written(_) => {
                if let Some(record) = pending.next() {
                    aligned.push(Aligned::Record(record));
                }
            }
            ExportSlot::Missing(file) => aligned.push(Aligned::Gap(file.clone())),
        }
    }

    if aligned.len() > statuses.len() {
        return Err(LedgerError::ReconcileOverflow {
            doc_id: doc_id.to_string(),
            records: aligned.len(),
            statuses: statuses.len(),
        });
    }

    let mut merged = Vec::with_capacity(statuses.len());
    let mut aligned = aligned.into_iter();
    for status in statuses {
        let status = status.as_ref();
        let record = match aligned.next() {
            Some(Aligned::Record(mut record)) => {
                record.apply_generator_status(status);
                record
            }
            Some(Aligned::Gap(file)) => {
                let reason = match LedgerStatus::from_generator(status) {
                    LedgerStatus::Success => format!("Missing export {file}"),
                    _ => status.to_string(),
                };
                ResultRecord::skipped(reason)
            }
            None => ResultRecord::from_generator(status),
        };
        merged.push(record);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(name: &str) -> ExportSlot {
        ExportSlot::Written(name.to_string())
    }

    fn missing(name: &str) -> ExportSlot {
        ExportSlot::Missing(name.to_string())
    }

    #[test]
    fn test_status_only_when_nothing_exported() {
        let merged = reconcile("Box.json", vec![], &[], &["Success", "NoFaces"]).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].status, Some(LedgerStatus::Success));
        assert_eq!(merged[1].status, Some(LedgerStatus::Skip));
        assert_eq!(merged[1].reason.as_deref(), Some("NoFaces"));
        assert!(merged.iter().all(|r| r.file.is_none()));
    }

    #[test]
    fn test_overwrite_in_place_keeps_file() {
        let records = vec![
            ResultRecord::exported("Couch_0000.json"),
            ResultRecord::exported("Couch_0001.json"),
        ];
        let slots = [written("Couch_0000.json"), written("Couch_0001.json")];
        let merged = reconcile("Couch.json", records, &slots, &["Success", "Success"]).unwrap();

        assert_eq!(merged.len(), 2);
        for (i, record) in merged.iter().enumerate() {
            assert!(record.is_success());
            assert_eq!(record.file.as_deref(), Some(format!("Couch_000{i}.json").as_str()));
        }
    }

    #[test]
    fn test_gap_in_the_middle_is_skipped_at_its_index() {
        let records = vec![
            ResultRecord::exported("Chair_0000.json"),
            ResultRecord::exported("Chair_0002.json"),
        ];
        let slots = [
            written("Chair_0000.json"),
            missing("Chair_0001.json"),
            written("Chair_0002.json"),
        ];
        let merged = reconcile(
            "Chair.json",
            records,
            &slots,
            &["Success", "Success", "Success"],
        )
        .unwrap();

        assert_eq!(merged.len(), 3);
        assert!(merged[0].is_success());
        assert_eq!(merged[0].file.as_deref(), Some("Chair_0000.json"));
        assert_eq!(merged[1].status, Some(LedgerStatus::Skip));
        assert!(merged[1].file.is_none());
        assert_eq!(merged[1].reason.as_deref(), Some("Missing export Chair_0001.json"));
        assert!(merged[2].is_success());
        assert_eq!(merged[2].file.as_deref(), Some("Chair_0002.json"));
    }

    #[test]
    fn test_gap_keeps_generator_reason_when_not_success() {
        let slots = [missing("Lamp_0000.json")];
        let merged = reconcile("Lamp.json", vec![], &slots, &["BadLoop"]).unwrap();
        assert_eq!(merged[0].reason.as_deref(), Some("BadLoop"));
    }

    #[test]
    fn test_statuses_beyond_exports_are_appended() {
        let records = vec![ResultRecord::exported("Desk_0000.json")];
        let slots = [written("Desk_0000.json")];
        let merged =
            reconcile("Desk.json", records, &slots, &["Success", "Unsupported"]).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].status, Some(LedgerStatus::Skip));
        assert_eq!(merged[1].reason.as_deref(), Some("Unsupported"));
    }

    #[test]
    fn test_more_units_than_statuses_is_reported() {
        let records = vec![
            ResultRecord::exported("Bed_0000.json"),
            ResultRecord::exported("Bed_0001.json"),
        ];
        let slots = [written("Bed_0000.json"), written("Bed_0001.json")];
        let err = reconcile("Bed.json", records, &slots, &["Success"]).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::ReconcileOverflow { records: 2, statuses: 1, .. }
        ));
    }

    #[test]
    fn test_record_count_must_match_written_slots() {
        let slots = [written("Bed_0000.json")];
        let err = reconcile("Bed.json", vec![], &slots, &["Success"]).unwrap_err();
        assert!(matches!(err, LedgerError::Misaligned { records: 0, exported: 1, .. }));
    }
}
