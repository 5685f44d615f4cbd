//! Indexed files and the entities decomposed from their paths.

use serde::{Deserialize, Serialize};

/// Entities decomposed from a BIDS path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// Subject label without the `sub-` prefix.
    pub subject: Option<String>,
    /// Session label without the `ses-` prefix.
    pub session: Option<String>,
    /// Datatype directory (e.g. "anat", "pet").
    pub datatype: Option<String>,
    /// Trailing suffix of the file name (e.g. "T1w", "participants").
    pub suffix: Option<String>,
    /// Extension including the leading dot (e.g. ".nii.gz").
    pub extension: Option<String>,
}

/// One file known to the dataset index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntity {
    /// Path relative to the dataset root, `/`-separated.
    pub relpath: String,
    pub entities: Entities,
}

impl FileEntity {
    pub fn new(relpath: impl Into<String>, entities: Entities) -> Self {
        Self {
            relpath: relpath.into(),
            entities,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.entities.subject.as_deref()
    }

    pub fn session(&self) -> Option<&str> {
        self.entities.session.as_deref()
    }

    pub fn datatype(&self) -> Option<&str> {
        self.entities.datatype.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.entities.suffix.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.entities.extension.as_deref()
    }
}

/// Filter over indexed files. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    subject: Option<String>,
    session: Option<String>,
    datatype: Option<String>,
    suffix: Option<String>,
    extension: Option<String>,
}

impl FileQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    #[must_use]
    pub fn datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Extension filter; the leading dot is optional.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(normalize_extension(&extension.into()));
        self
    }

    /// Returns true if the file satisfies every filter that is set.
    pub fn matches(&self, file: &FileEntity) -> bool {
        field_matches(self.subject.as_deref(), file.subject())
            && field_matches(self.session.as_deref(), file.session())
            && field_matches(self.datatype.as_deref(), file.datatype())
            && field_matches(self.suffix.as_deref(), file.suffix())
            && field_matches(self.extension.as_deref(), file.extension())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}
