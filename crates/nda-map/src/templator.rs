//! Per-subject path templating.

use std::collections::{BTreeMap, BTreeSet};

use nda_ingest::DatasetIndex;
use nda_model::{DatatypeMappingSet, FileQuery, SUBJECT_PLACEHOLDER, replace_entity_label};

/// Templates for one subject, keyed by datatype.
pub type SubjectTemplates = BTreeMap<String, Vec<String>>;

/// Derives `{SUBJECT}` templates from every subject's files and merges them per datatype.
///
/// Construction is pure: nothing is written until the mappings are handed to
/// a [`TemplateEmitter`](crate::TemplateEmitter).
#[derive(Debug, Clone)]
pub struct MappingTemplator {
    subject_templates: BTreeMap<String, SubjectTemplates>,
    mappings: BTreeMap<String, DatatypeMappingSet>,
}

impl MappingTemplator {
    pub fn new<I: DatasetIndex + ?Sized>(index: &I) -> Self {
        let datatypes = index.datatypes();
        let subject_templates = populate_subject_templates(index, &datatypes);

        let mut general: BTreeMap<String, BTreeSet<String>> = datatypes
            .iter()
            .map(|datatype| (datatype.clone(), BTreeSet::new()))
            .collect();
        for per_datatype in subject_templates.values() {
            for (datatype, templates) in per_datatype {
                general
                    .entry(datatype.clone())
                    .or_default()
                    .extend(templates.iter().cloned());
            }
        }

        let mappings = general
            .into_iter()
            .map(|(datatype, templates)| {
                tracing::debug!(
                    datatype = %datatype,
                    template_count = templates.len(),
                    "aggregated subject templates"
                );
                let set = DatatypeMappingSet::from_templates(datatype.clone(), templates);
                (datatype, set)
            })
            .collect();

        Self {
            subject_templates,
            mappings,
        }
    }

    /// Templates contributed by one subject before deduplication.
    pub fn subject_templates(&self, subject: &str) -> Option<&SubjectTemplates> {
        self.subject_templates.get(subject)
    }

    pub fn mapping(&self, datatype: &str) -> Option<&DatatypeMappingSet> {
        self.mappings.get(datatype)
    }

    pub fn mappings(&self) -> impl Iterator<Item = &DatatypeMappingSet> {
        self.mappings.values()
    }

    pub fn datatypes(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }
}

fn populate_subject_templates<I: DatasetIndex + ?Sized>(
    index: &I,
    datatypes: &[String],
) -> BTreeMap<String, SubjectTemplates> {
    let mut out = BTreeMap::new();
    for subject in index.subjects() {
        let mut per_datatype = SubjectTemplates::new();
        for datatype in datatypes {
            let query = FileQuery::new().subject(&subject).datatype(datatype);
            let templates = index
                .files_for(&query)
                .into_iter()
                .map(|file| {
                    replace_entity_label(&file.relpath, "sub", &subject, SUBJECT_PLACEHOLDER)
                })
                .collect();
            per_datatype.insert(datatype.clone(), templates);
        }
        out.insert(subject, per_datatype);
    }
    out
}
