//! Filesystem-backed BIDS layout.

use std::path::{Path, PathBuf};

use nda_model::{Entities, FileEntity};

use crate::error::{IngestError, Result};
use crate::index::DatasetIndex;

/// Datatype directory names recognised below `sub-*` (and `ses-*`) folders.
pub const BIDS_DATATYPES: [&str; 13] = [
    "anat", "beh", "dwi", "eeg", "fmap", "func", "ieeg", "meg", "micr", "motion", "nirs", "perf",
    "pet",
];

/// Top-level directories that are not part of the raw dataset.
const IGNORED_DIRS: [&str; 4] = ["code", "derivatives", "models", "sourcedata"];

/// In-memory index of a BIDS dataset, built once from a directory walk.
#[derive(Debug, Clone)]
pub struct BidsLayout {
    root: PathBuf,
    files: Vec<FileEntity>,
}

impl BidsLayout {
    /// Indexes every file under `root`.
    ///
    /// Dot-files and the `code`, `derivatives`, `models` and `sourcedata`
    /// top-level directories are skipped.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IngestError::DatasetNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut relpaths = Vec::new();
        walk(root, root, &mut relpaths)?;
        let files = relpaths
            .into_iter()
            .map(|relpath| {
                let entities = parse_entities(&relpath);
                FileEntity::new(relpath, entities)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            root = %root.display(),
            file_count = files.len(),
            "indexed BIDS dataset"
        );

        Ok(Self::from_files(root, files))
    }

    /// Builds a layout from already-decomposed files.
    pub fn from_files(root: impl Into<PathBuf>, mut files: Vec<FileEntity>) -> Self {
        files.sort_by(|a, b| a.relpath.cmp(&b.relpath));
        Self {
            root: root.into(),
            files,
        }
    }
}

impl DatasetIndex for BidsLayout {
    fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self) -> &[FileEntity] {
        &self.files
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping entry with non-UTF-8 name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if dir == root && IGNORED_DIRS.contains(&name) {
                continue;
            }
            walk(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let relpath = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(relpath);
        }
    }
    Ok(())
}

/// Decomposes a dataset-relative path into BIDS entities.
///
/// `sub-`/`ses-` labels come from the file name, falling back to the
/// enclosing directories. The datatype is the parent directory when it is a
/// known datatype inside a subject folder.
pub fn parse_entities(relpath: &str) -> Entities {
    let parts: Vec<&str> = relpath.split('/').filter(|p| !p.is_empty()).collect();
    let Some((file_name, dirs)) = parts.split_last() else {
        return Entities::default();
    };

    let (stem, extension) = match file_name.find('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], Some(file_name[idx..].to_string())),
        _ => (*file_name, None),
    };

    let mut entities = Entities {
        extension,
        ..Entities::default()
    };

    let tokens: Vec<&str> = stem.split('_').collect();
    for token in &tokens {
        match token.split_once('-') {
            Some(("sub", label)) if !label.is_empty() => {
                entities.subject = Some(label.to_string());
            }
            Some(("ses", label)) if !label.is_empty() => {
                entities.session = Some(label.to_string());
            }
            _ => {}
        }
    }
    if let Some(last) = tokens.last()
        && !last.is_empty()
        && !last.contains('-')
    {
        entities.suffix = Some((*last).to_string());
    }

    for dir in dirs {
        if let Some(label) = dir.strip_prefix("sub-") {
            entities.subject.get_or_insert_with(|| label.to_string());
        } else if let Some(label) = dir.strip_prefix("ses-") {
            entities.session.get_or_insert_with(|| label.to_string());
        }
    }

    let in_subject = dirs.first().is_some_and(|d| d.starts_with("sub-"));
    if in_subject
        && let Some(parent) = dirs.last()
        && BIDS_DATATYPES.contains(parent)
    {
        entities.datatype = Some((*parent).to_string());
    }

    entities
}
