//! Error types for file placement and upload preparation.

use std::path::PathBuf;
use thiserror::Error;

use nda_lookup::LookupError;
use nda_model::ModelError;

/// Failure placing the files of one mapping document for one record.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Every destination already exists; nothing new was placed.
    #[error("destination already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace existing {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to link {source_path} to {destination}: {source}")]
    Link {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {source_path} to {destination}: {source}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("the provided destination was not a directory: {path}")]
    DestinationNotFound { path: PathBuf },

    #[error("the provided source was not a directory: {path}")]
    SourceNotFound { path: PathBuf },

    #[error(transparent)]
    MalformedLabel(#[from] ModelError),

    /// Mapping document file name without an `_` separating head and tail.
    #[error("mapping document name \"{name}\" has no \"_\" separator")]
    MalformedDocumentName { name: String },

    #[error("failed to read mapping document {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping document {path}: {source}")]
    ParseDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to list {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove empty directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl PrepareError {
    /// Format errors abort a document and map to a distinct exit status in the CLI.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedLabel(_) | Self::MalformedDocumentName { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PrepareError>;
