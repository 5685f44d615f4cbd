//! Data model for preparing BIDS datasets for NDA upload.
//!
//! The types here are shared by the ingest, templating, lookup and placement
//! crates. Nothing in this crate touches the filesystem.

pub mod descriptor;
pub mod entity;
pub mod error;
pub mod record;
pub mod template;

pub use descriptor::{ImageDescriptor, SUPPORTED_DATATYPES};
pub use entity::{Entities, FileEntity, FileQuery};
pub use error::{ModelError, Result};
pub use record::{LOOKUP_COLUMNS, MISSING_VALUE, ParticipantRecord, SubjectSession};
pub use template::{
    Bindings, DatatypeMappingSet, GUID_PLACEHOLDER, MappingDocument, SESSION_PLACEHOLDER,
    SUBJECT_PLACEHOLDER, bind, destination_template, generalize, replace_entity_label,
};
