//! Dataset-wide template collection.
//!
//! Unlike [`MappingTemplator`](crate::MappingTemplator), this pass generalizes
//! session labels as well, so datasets with sessions collapse to
//! `ses-{SESSION}` templates.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use nda_ingest::{BidsLayout, DatasetIndex};
use nda_model::{DatatypeMappingSet, generalize};
use serde::Serialize;

use crate::error::Result;

/// Templates and observed suffixes for one datatype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatatypeTemplates {
    pub suffixes: BTreeSet<String>,
    pub templates: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetTemplates {
    #[serde(flatten)]
    pub datatypes: BTreeMap<String, DatatypeTemplates>,
    /// Files outside any datatype directory (README, dataset_description.json, ...).
    pub top_level: BTreeSet<String>,
    pub bids_dataset: PathBuf,
    pub filemapped_dataset_path: PathBuf,
}

impl DatasetTemplates {
    /// One mapping set per datatype; top-level files are shared by every set.
    pub fn to_mapping_sets(&self) -> Vec<DatatypeMappingSet> {
        self.datatypes
            .iter()
            .map(|(datatype, entry)| {
                DatatypeMappingSet::from_templates(
                    datatype.clone(),
                    entry.templates.iter().chain(self.top_level.iter()),
                )
            })
            .collect()
    }
}

/// `<root>.nda` next to the dataset root.
pub fn default_filemapped_destination(root: &Path) -> PathBuf {
    sibling_with_suffix(root, ".nda")
}

pub(crate) fn sibling_with_suffix(root: &Path, suffix: &str) -> PathBuf {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    root.with_file_name(format!("{name}{suffix}"))
}

/// Generalizes every indexed file and groups the templates by datatype.
pub fn collect_dataset_templates<I: DatasetIndex + ?Sized>(
    index: &I,
    destination: Option<&Path>,
) -> DatasetTemplates {
    let root = index.root().to_path_buf();
    let mut datatypes: BTreeMap<String, DatatypeTemplates> = index
        .datatypes()
        .into_iter()
        .map(|datatype| (datatype, DatatypeTemplates::default()))
        .collect();
    let mut top_level = BTreeSet::new();

    for file in index.files() {
        let template = generalize(&file.relpath, file.subject(), file.session());
        match file.datatype() {
            Some(datatype) => {
                let entry = datatypes.entry(datatype.to_string()).or_default();
                if let Some(suffix) = file.suffix() {
                    entry.suffixes.insert(suffix.to_string());
                }
                entry.templates.insert(template);
            }
            None if file.subject().is_none() => {
                top_level.insert(template);
            }
            None => {
                tracing::debug!(path = %file.relpath, "skipping subject file outside a datatype");
            }
        }
    }

    let filemapped_dataset_path = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_filemapped_destination(&root));

    DatasetTemplates {
        datatypes,
        top_level,
        bids_dataset: root,
        filemapped_dataset_path,
    }
}

/// Indexes `root` and collects its templates.
pub fn collect_from_path(root: &Path, destination: Option<&Path>) -> Result<DatasetTemplates> {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let layout = BidsLayout::open(&root)?;
    Ok(collect_dataset_templates(&layout, destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nda_ingest::parse_entities;
    use nda_model::FileEntity;

    fn layout(paths: &[&str]) -> BidsLayout {
        let files = paths
            .iter()
            .map(|p| FileEntity::new(*p, parse_entities(p)))
            .collect();
        BidsLayout::from_files("/data/ds004869", files)
    }

    #[test]
    fn sessions_collapse_to_one_template() {
        let index = layout(&[
            "README",
            "participants.tsv",
            "sub-01/ses-baseline/pet/sub-01_ses-baseline_pet.nii.gz",
            "sub-01/ses-rescan/pet/sub-01_ses-rescan_pet.nii.gz",
            "sub-02/ses-baseline/pet/sub-02_ses-baseline_pet.nii.gz",
            "sub-02/sub-02_sessions.tsv",
        ]);
        let collected = collect_dataset_templates(&index, None);

        let pet = &collected.datatypes["pet"];
        assert_eq!(
            pet.templates.iter().collect::<Vec<_>>(),
            vec!["sub-{SUBJECT}/ses-{SESSION}/pet/sub-{SUBJECT}_ses-{SESSION}_pet.nii.gz"]
        );
        assert!(pet.suffixes.contains("pet"));
        assert_eq!(
            collected.top_level.iter().collect::<Vec<_>>(),
            vec!["README", "participants.tsv"]
        );
        assert_eq!(
            collected.filemapped_dataset_path,
            PathBuf::from("/data/ds004869.nda")
        );
    }

    #[test]
    fn mapping_sets_include_top_level_files() {
        let index = layout(&["CHANGES", "sub-01/anat/sub-01_T1w.json"]);
        let sets = collect_dataset_templates(&index, None).to_mapping_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].document.get("CHANGES"), Some("CHANGES"));
        assert_eq!(
            sets[0].document.get("sub-{SUBJECT}/anat/sub-{SUBJECT}_T1w.json"),
            Some("sub-{GUID}/anat/sub-{GUID}_T1w.json")
        );
    }

    #[test]
    fn serializes_datatypes_at_top_level() {
        let index = layout(&["sub-01/anat/sub-01_T1w.json"]);
        let collected = collect_dataset_templates(&index, Some(Path::new("/out")));
        let json = serde_json::to_value(&collected).unwrap();
        assert!(json["anat"]["templates"].is_array());
        assert_eq!(json["filemapped_dataset_path"], "/out");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = collect_from_path(&dir.path().join("absent"), None).unwrap_err();
        assert!(err.to_string().contains("BIDS root does not exist"));
    }
}
