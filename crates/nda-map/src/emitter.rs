//! Writes mapping documents and image03 descriptors.

use std::path::{Path, PathBuf};

use nda_model::{DatatypeMappingSet, ImageDescriptor, SUPPORTED_DATATYPES};
use serde::Serialize;

use crate::collect::sibling_with_suffix;
use crate::error::{MapError, Result};

/// Prefix shared by every emitted document name.
pub const NDA_FILE_DESCRIPTOR: &str = "image03_sourcedata";

/// `image03_sourcedata.<datatype>.<datatype>`, the stem of both documents for a datatype.
pub fn document_stem(datatype: &str) -> String {
    format!("{NDA_FILE_DESCRIPTOR}.{datatype}.{datatype}")
}

/// `<root>_nda_upload` next to the dataset root.
pub fn default_upload_destination(root: &Path) -> PathBuf {
    sibling_with_suffix(root, "_nda_upload")
}

/// Paths written for one datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedDocuments {
    pub datatype: String,
    pub mapping: PathBuf,
    pub descriptor: PathBuf,
    pub template_count: usize,
}

#[derive(Debug, Clone)]
pub struct TemplateEmitter {
    destination: PathBuf,
}

impl TemplateEmitter {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Emitter targeting the default upload directory for a dataset.
    pub fn for_dataset(root: &Path) -> Self {
        Self::new(default_upload_destination(root))
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Writes `<stem>.json` and `<stem>.yaml` for every mapping set.
    ///
    /// All datatypes are checked against the descriptor table before anything
    /// is written.
    pub fn emit<'a, I>(&self, mappings: I) -> Result<Vec<EmittedDocuments>>
    where
        I: IntoIterator<Item = &'a DatatypeMappingSet>,
    {
        let planned = mappings
            .into_iter()
            .map(|set| {
                ImageDescriptor::for_datatype(&set.datatype)
                    .map(|descriptor| (set, descriptor))
                    .ok_or_else(|| MapError::UnsupportedDatatype {
                        datatype: set.datatype.clone(),
                        supported: SUPPORTED_DATATYPES.join(", "),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        std::fs::create_dir_all(&self.destination).map_err(|e| MapError::CreateDir {
            path: self.destination.clone(),
            source: e,
        })?;

        let mut emitted = Vec::with_capacity(planned.len());
        for (set, descriptor) in planned {
            let stem = document_stem(&set.datatype);
            let mapping = self.destination.join(format!("{stem}.json"));
            let descriptor_path = self.destination.join(format!("{stem}.yaml"));

            write_file(&mapping, &to_indented_json(&set.document, &mapping)?)?;
            let yaml = serde_yaml::to_string(&descriptor).map_err(|e| MapError::Serialize {
                path: descriptor_path.clone(),
                message: e.to_string(),
            })?;
            write_file(&descriptor_path, yaml.as_bytes())?;

            tracing::info!(
                datatype = %set.datatype,
                templates = set.document.len(),
                path = %mapping.display(),
                "wrote mapping document"
            );

            emitted.push(EmittedDocuments {
                datatype: set.datatype.clone(),
                mapping,
                descriptor: descriptor_path,
                template_count: set.document.len(),
            });
        }
        Ok(emitted)
    }
}

fn to_indented_json<T: Serialize>(value: &T, path: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| MapError::Serialize {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(buf)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| MapError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
