//! Error types for templating and emission.

use std::path::PathBuf;
use thiserror::Error;

use nda_ingest::IngestError;

#[derive(Debug, Error)]
pub enum MapError {
    /// Datatype without an image03 descriptor.
    #[error("unsupported datatype '{datatype}': no image03 descriptor (supported: {supported})")]
    UnsupportedDatatype { datatype: String, supported: String },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {message}")]
    Serialize { path: PathBuf, message: String },

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, MapError>;
