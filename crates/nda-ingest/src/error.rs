//! Error types for dataset indexing and participants loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while indexing a dataset or loading its participants files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Dataset root is missing or not a directory.
    #[error("BIDS root does not exist: {path}")]
    DatasetNotFound { path: PathBuf },

    /// A required input file is absent (participants.tsv, participants.json).
    #[error("missing required input file: {path}")]
    MissingInput { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Failed to parse the participants table with Polars.
    #[error("failed to parse table {path}: {message}")]
    TableParse { path: PathBuf, message: String },

    /// Failed to parse a JSON sidecar.
    #[error("failed to parse JSON sidecar {path}: {source}")]
    SidecarParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Sidecar top level is not an object.
    #[error("unexpected sidecar format in {path}: expected a JSON object")]
    SidecarFormat { path: PathBuf },

    /// Required column not found in a table.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
