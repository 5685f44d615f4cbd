//! Walks the mapping documents in an upload directory and places files per lookup row.

use std::path::{Path, PathBuf};

use nda_lookup::{LOOKUP_FILE_NAME, read_lookup_csv};
use nda_model::{Bindings, MappingDocument, ParticipantRecord};

use crate::error::{PlacementError, PrepareError, Result};
use crate::naming::DocumentName;
use crate::placer::{FileMapper, FilePlacer, PlacementMode, PlacementRequest};
use crate::report::{DocumentReport, PrepareReport};
use crate::scope::{ScopedRecord, TemplateScope, filter_records};

#[derive(Debug)]
pub struct Preparer<P = FileMapper> {
    source: PathBuf,
    destination: PathBuf,
    placer: P,
    mode: PlacementMode,
}

impl Preparer<FileMapper> {
    /// Preparer using the default [`FileMapper`].
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Result<Self> {
        Self::with_placer(source, destination, FileMapper)
    }
}

impl<P: FilePlacer> Preparer<P> {
    /// Checks that both roots are directories. The destination is checked first.
    pub fn with_placer(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        placer: P,
    ) -> Result<Self> {
        let source = source.into();
        let destination = destination.into();
        if !destination.is_dir() {
            return Err(PrepareError::DestinationNotFound { path: destination });
        }
        if !source.is_dir() {
            return Err(PrepareError::SourceNotFound { path: source });
        }
        Ok(Self {
            source,
            destination,
            placer,
            mode: PlacementMode::Symlink,
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PlacementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn placer(&self) -> &P {
        &self.placer
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn lookup_path(&self) -> PathBuf {
        self.destination.join(LOOKUP_FILE_NAME)
    }

    /// `*.json` files directly inside the destination, sorted by name.
    pub fn mapping_documents(&self) -> Result<Vec<PathBuf>> {
        let list_err = |e| PrepareError::ListDirectory {
            path: self.destination.clone(),
            source: e,
        };
        let mut documents = Vec::new();
        for entry in std::fs::read_dir(&self.destination).map_err(list_err)? {
            let path = entry.map_err(list_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                documents.push(path);
            }
        }
        documents.sort();
        Ok(documents)
    }

    /// Reads `<destination>/lookup.csv` and places every mapping document.
    pub fn run(&self) -> Result<PrepareReport> {
        let records = read_lookup_csv(&self.lookup_path())?;
        self.run_with_records(&records)
    }

    pub fn run_with_records(&self, records: &[ParticipantRecord]) -> Result<PrepareReport> {
        let mut report = PrepareReport::default();
        for path in self.mapping_documents()? {
            report.documents.push(self.prepare_document(&path, records));
        }
        Ok(report)
    }

    /// Places one document. Errors abort only this document and are kept in the report.
    pub fn prepare_document(&self, path: &Path, records: &[ParticipantRecord]) -> DocumentReport {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut report = DocumentReport::new(&name);
        if let Err(e) = self.place_document(path, records, &mut report) {
            tracing::error!(document = %name, error = %e, "mapping document aborted");
            report.error = Some(e);
        }
        report
    }

    fn place_document(
        &self,
        path: &Path,
        records: &[ParticipantRecord],
        report: &mut DocumentReport,
    ) -> Result<()> {
        let name = DocumentName::from_path(path)?;
        let mapping = load_mapping(path)?;
        let scope = TemplateScope::inspect(&mapping);
        report.scope = Some(scope);

        let kept = filter_records(records, scope)?;
        report.matched = kept.len();
        tracing::info!(
            document = %report.document,
            scope = %scope,
            matched = kept.len(),
            total = records.len(),
            "filtered lookup rows"
        );

        let parent_dir = self.destination.join(&name.parent);
        for row in &kept {
            self.place_row(&mapping, &name, &parent_dir, row, report)?;
        }
        Ok(())
    }

    fn place_row(
        &self,
        mapping: &MappingDocument,
        name: &DocumentName,
        parent_dir: &Path,
        row: &ScopedRecord<'_>,
        report: &mut DocumentReport,
    ) -> Result<()> {
        let label = &row.record.bids_subject_session;
        let Some(guid) = row.record.guid() else {
            tracing::warn!(label = %label, "no subjectkey for row, skipping");
            report.skipped += 1;
            return Ok(());
        };

        let child = parent_dir.join(name.child_dir_name(&guid, &row.label));
        std::fs::create_dir_all(&child).map_err(|e| PrepareError::CreateDir {
            path: child.clone(),
            source: e,
        })?;

        let mut bindings = Bindings::new()
            .with("SUBJECT", row.label.subject.as_str())
            .with("GUID", guid.as_str());
        if let Some(session) = &row.label.session {
            bindings = bindings.with("SESSION", session.as_str());
        }
        let request = PlacementRequest {
            mapping,
            source_root: &self.source,
            destination: &child,
            bindings,
            mode: self.mode,
            overwrite: false,
        };

        match self.placer.place(&request) {
            Ok(outcome) => {
                tracing::debug!(
                    label = %label,
                    placed = outcome.placed,
                    existing = outcome.existing,
                    missing = outcome.missing_sources,
                    "placed files"
                );
                report.files += outcome.placed;
            }
            Err(PlacementError::AlreadyExists { path }) => {
                tracing::debug!(label = %label, path = %path.display(), "already placed");
            }
            Err(e) => {
                tracing::warn!(label = %label, error = %e, "placement failed, skipping row");
                report.skipped += 1;
                remove_if_flat(&child)?;
                return Ok(());
            }
        }

        if remove_if_flat(&child)? {
            tracing::debug!(dir = %child.display(), "removed directory without subdirectories");
            report.removed_empty += 1;
        } else {
            report.placed += 1;
        }
        Ok(())
    }
}

fn load_mapping(path: &Path) -> Result<MappingDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| PrepareError::ReadDocument {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| PrepareError::ParseDocument {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Removes `dir` and its files if it holds no subdirectories. Returns true if removed.
fn remove_if_flat(dir: &Path) -> Result<bool> {
    let cleanup_err = |e| PrepareError::Cleanup {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(cleanup_err)? {
        let entry = entry.map_err(cleanup_err)?;
        if entry.file_type().map_err(cleanup_err)?.is_dir() {
            return Ok(false);
        }
        files.push(entry.path());
    }
    for file in files {
        std::fs::remove_file(&file).map_err(cleanup_err)?;
    }
    std::fs::remove_dir(dir).map_err(cleanup_err)?;
    Ok(true)
}
