//! Dataset index seam.

use std::collections::BTreeSet;
use std::path::Path;

use nda_model::{FileEntity, FileQuery};

/// Read-only view over an indexed dataset.
///
/// Every component receives the same index by reference so all passes see
/// one consistent snapshot of the dataset.
pub trait DatasetIndex {
    /// Dataset root directory.
    fn root(&self) -> &Path;

    /// All indexed files, ordered by relative path.
    fn files(&self) -> &[FileEntity];

    /// Sorted, unique subject labels.
    fn subjects(&self) -> Vec<String> {
        unique(self.files().iter().filter_map(FileEntity::subject))
    }

    /// Sorted, unique session labels.
    fn sessions(&self) -> Vec<String> {
        unique(self.files().iter().filter_map(FileEntity::session))
    }

    /// Sorted, unique datatypes.
    fn datatypes(&self) -> Vec<String> {
        unique(self.files().iter().filter_map(FileEntity::datatype))
    }

    /// Files matching the query, in index order.
    fn files_for(&self, query: &FileQuery) -> Vec<&FileEntity> {
        self.files().iter().filter(|file| query.matches(file)).collect()
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
