//! File placement seam and the default symlink/copy implementation.

use std::io;
use std::path::{Path, PathBuf};

use nda_model::{Bindings, MappingDocument, bind};

use crate::error::PlacementError;

/// How files reach the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlacementMode {
    /// Symlink to the absolute source path.
    #[default]
    Symlink,
    Copy,
}

/// Everything a placer needs to realize one mapping document for one record.
#[derive(Debug, Clone)]
pub struct PlacementRequest<'a> {
    pub mapping: &'a MappingDocument,
    pub source_root: &'a Path,
    pub destination: &'a Path,
    pub bindings: Bindings,
    pub mode: PlacementMode,
    pub overwrite: bool,
}

/// Counts from one placement call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub placed: usize,
    /// Destinations left in place because they already existed.
    pub existing: usize,
    /// Mapping entries whose bound source path does not exist.
    pub missing_sources: usize,
}

/// Places the files named by a mapping document.
///
/// Implementations return [`PlacementError::AlreadyExists`] when the request
/// had nothing left to place; callers treat that as success.
pub trait FilePlacer {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementOutcome, PlacementError>;
}

/// Binds both sides of every mapping entry and links or copies the source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMapper;

impl FilePlacer for FileMapper {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementOutcome, PlacementError> {
        let mut outcome = PlacementOutcome::default();
        let mut first_existing: Option<PathBuf> = None;

        for (source_template, destination_template) in request.mapping.iter() {
            let source = request
                .source_root
                .join(bind(source_template, &request.bindings));
            let destination = request
                .destination
                .join(bind(destination_template, &request.bindings));

            if !source.exists() {
                tracing::trace!(source = %source.display(), "source missing, skipping entry");
                outcome.missing_sources += 1;
                continue;
            }

            if destination.symlink_metadata().is_ok() {
                if !request.overwrite {
                    first_existing.get_or_insert_with(|| destination.clone());
                    outcome.existing += 1;
                    continue;
                }
                std::fs::remove_file(&destination).map_err(|e| PlacementError::Remove {
                    path: destination.clone(),
                    source: e,
                })?;
            }

            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|e| PlacementError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            match request.mode {
                PlacementMode::Symlink => {
                    let target = std::path::absolute(&source).unwrap_or_else(|_| source.clone());
                    symlink_file(&target, &destination).map_err(|e| PlacementError::Link {
                        source_path: target.clone(),
                        destination: destination.clone(),
                        source: e,
                    })?;
                }
                PlacementMode::Copy => {
                    std::fs::copy(&source, &destination).map_err(|e| PlacementError::Copy {
                        source_path: source.clone(),
                        destination: destination.clone(),
                        source: e,
                    })?;
                }
            }
            outcome.placed += 1;
        }

        match first_existing {
            Some(path) if outcome.placed == 0 => Err(PlacementError::AlreadyExists { path }),
            _ => Ok(outcome),
        }
    }
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
