//! Destination directory naming.

use std::path::Path;

use nda_model::SubjectSession;

use crate::error::{PrepareError, Result};

/// Mapping document file name split for directory naming.
///
/// `image03_sourcedata.pet.pet.json` has parent `image03_sourcedata.pet.pet`
/// and tail `sourcedata.pet.pet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentName {
    pub parent: String,
    pub tail: String,
}

impl DocumentName {
    pub fn parse(file_name: &str) -> Result<Self> {
        let parent = file_name.strip_suffix(".json").unwrap_or(file_name);
        let (_, tail) = parent
            .split_once('_')
            .ok_or_else(|| PrepareError::MalformedDocumentName {
                name: file_name.to_string(),
            })?;
        Ok(Self {
            parent: parent.to_string(),
            tail: tail.to_string(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&name)
    }

    /// `sub-<guid>_ses-<session>.<tail>` or `sub-<guid>.<tail>`.
    pub fn child_dir_name(&self, guid: &str, label: &SubjectSession) -> String {
        match label.session_dir() {
            Some(session) => format!("sub-{guid}_{session}.{}", self.tail),
            None => format!("sub-{guid}.{}", self.tail),
        }
    }
}
