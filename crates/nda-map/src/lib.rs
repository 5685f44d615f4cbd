//! Path templating for NDA uploads.
//!
//! [`MappingTemplator`] turns each subject's files into `{SUBJECT}` templates
//! and merges them per datatype; [`collect_dataset_templates`] does the same
//! across the whole dataset with sessions generalized too. A
//! [`TemplateEmitter`] then writes the mapping documents and their image03
//! descriptors.

mod collect;
mod emitter;
mod error;
mod templator;

pub use collect::{
    DatasetTemplates, DatatypeTemplates, collect_dataset_templates, collect_from_path,
    default_filemapped_destination,
};
pub use emitter::{
    EmittedDocuments, NDA_FILE_DESCRIPTOR, TemplateEmitter, default_upload_destination,
    document_stem,
};
pub use error::{MapError, Result};
pub use templator::{MappingTemplator, SubjectTemplates};
