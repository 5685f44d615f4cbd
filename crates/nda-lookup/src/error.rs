//! Error types for lookup table construction and persistence.

use std::path::PathBuf;
use thiserror::Error;

use nda_ingest::IngestError;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Participants files missing or unreadable.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A subject in the dataset has no row in the participants table.
    #[error("subject sub-{subject} has no row in {table}")]
    UnknownSubject { subject: String, table: PathBuf },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write lookup table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read lookup table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("lookup table {path} is missing column '{column}'")]
    MissingColumn { column: String, path: PathBuf },

    #[error("invalid {column} value '{value}' in {path}")]
    InvalidValue {
        column: String,
        value: String,
        path: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, LookupError>;
