//! Per-document placement results.

use crate::error::PrepareError;
use crate::scope::TemplateScope;

/// What happened to one mapping document.
#[derive(Debug, Default)]
pub struct DocumentReport {
    /// Mapping document file name.
    pub document: String,
    /// `None` when the document could not be read.
    pub scope: Option<TemplateScope>,
    /// Lookup rows accepted by the scope filter.
    pub matched: usize,
    /// Rows whose directory was created and kept.
    pub placed: usize,
    /// Files linked or copied across all rows.
    pub files: usize,
    /// Rows without a subject key or whose placement failed.
    pub skipped: usize,
    /// Rows whose directory ended up without subdirectories and was removed.
    pub removed_empty: usize,
    /// Error that aborted the document.
    pub error: Option<PrepareError>,
}

impl DocumentReport {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct PrepareReport {
    pub documents: Vec<DocumentReport>,
}

impl PrepareReport {
    pub fn failed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.is_ok())
    }

    /// True if any document was aborted by a malformed label or document name.
    pub fn has_format_errors(&self) -> bool {
        self.documents
            .iter()
            .any(|d| d.error.as_ref().is_some_and(PrepareError::is_format_error))
    }

    pub fn total_placed(&self) -> usize {
        self.documents.iter().map(|d| d.placed).sum()
    }

    pub fn total_files(&self) -> usize {
        self.documents.iter().map(|d| d.files).sum()
    }
}
