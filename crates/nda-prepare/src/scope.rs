//! Session-aware classification of mapping documents and lookup row filtering.

use std::collections::BTreeSet;
use std::fmt;

use nda_model::{MappingDocument, ParticipantRecord, SESSION_PLACEHOLDER, SubjectSession};

use crate::error::Result;

/// Whether a mapping document places per-session or per-subject files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateScope {
    SessionRequired,
    SubjectOnly,
}

impl TemplateScope {
    /// `SessionRequired` when any destination template mentions `{SESSION}`.
    pub fn inspect(document: &MappingDocument) -> Self {
        if document
            .destinations()
            .any(|destination| destination.contains(SESSION_PLACEHOLDER))
        {
            Self::SessionRequired
        } else {
            Self::SubjectOnly
        }
    }

    pub fn accepts(self, label: &SubjectSession) -> bool {
        match self {
            Self::SessionRequired => label.has_session(),
            Self::SubjectOnly => !label.has_session(),
        }
    }
}

impl fmt::Display for TemplateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionRequired => f.write_str("session"),
            Self::SubjectOnly => f.write_str("subject"),
        }
    }
}

/// A lookup row accepted for placement, with its parsed label.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedRecord<'a> {
    pub record: &'a ParticipantRecord,
    pub label: SubjectSession,
}

/// Keeps the rows that match `scope`, in input order.
///
/// Every label is parsed before any row is kept, so one malformed label
/// rejects the whole batch. Rows repeating a (label, subjectkey) pair are
/// dropped after the first.
pub fn filter_records(
    records: &[ParticipantRecord],
    scope: TemplateScope,
) -> Result<Vec<ScopedRecord<'_>>> {
    let parsed = records
        .iter()
        .map(|record| record.subject_session().map(|label| (record, label)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut seen = BTreeSet::new();
    let kept = parsed
        .into_iter()
        .filter(|(_, label)| scope.accepts(label))
        .filter(|(record, _)| {
            seen.insert((
                record.bids_subject_session.clone(),
                record.subjectkey.clone(),
            ))
        })
        .map(|(record, label)| ScopedRecord { record, label })
        .collect();
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepareError;

    fn record(label: &str, subjectkey: &str) -> ParticipantRecord {
        let mut record = ParticipantRecord::new("x", None, "pet").with_subjectkey(subjectkey);
        record.bids_subject_session = label.to_string();
        record
    }

    fn document(destination: &str) -> MappingDocument {
        [("src".to_string(), destination.to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn session_placeholder_requires_sessions() {
        assert_eq!(
            TemplateScope::inspect(&document("sub-{GUID}/ses-{SESSION}/pet/x.json")),
            TemplateScope::SessionRequired
        );
        assert_eq!(
            TemplateScope::inspect(&document("sub-{GUID}/anat/x.json")),
            TemplateScope::SubjectOnly
        );
        assert_eq!(
            TemplateScope::inspect(&MappingDocument::new()),
            TemplateScope::SubjectOnly
        );
    }

    #[test]
    fn rows_follow_the_document_scope() {
        let rows = vec![
            record("sub-01_ses-baseline", "GUID1"),
            record("sub-01", "GUID1"),
            record("sub-02_ses-baseline", "GUID2"),
        ];

        let sessioned = filter_records(&rows, TemplateScope::SessionRequired).unwrap();
        let labels: Vec<_> = sessioned
            .iter()
            .map(|r| r.record.bids_subject_session.as_str())
            .collect();
        assert_eq!(labels, vec!["sub-01_ses-baseline", "sub-02_ses-baseline"]);

        let plain = filter_records(&rows, TemplateScope::SubjectOnly).unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].label.subject, "01");
    }

    #[test]
    fn duplicate_rows_are_placed_once() {
        let rows = vec![
            record("sub-01_ses-baseline", "GUID1"),
            record("sub-01_ses-baseline", "GUID1"),
            record("sub-01_ses-baseline", "GUID9"),
        ];
        let kept = filter_records(&rows, TemplateScope::SessionRequired).unwrap();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn malformed_label_rejects_the_batch() {
        let rows = vec![
            record("sub-01_ses-baseline", "GUID1"),
            record("sub-01_ses-a_run-1", "GUID1"),
        ];
        let err = filter_records(&rows, TemplateScope::SessionRequired).unwrap_err();
        assert!(matches!(err, PrepareError::MalformedLabel(_)));

        let rows = vec![record("sub-01_baseline", "GUID1")];
        let err = filter_records(&rows, TemplateScope::SubjectOnly).unwrap_err();
        assert!(err.to_string().contains("_ses-"));

        let rows = vec![record("01", "GUID1")];
        assert!(filter_records(&rows, TemplateScope::SubjectOnly).is_err());
    }
}
