//! Path templates and placeholder substitution.
//!
//! A template is a dataset-relative path whose subject and session labels have
//! been replaced by `{SUBJECT}` and `{SESSION}`. Destination templates use
//! `{GUID}` in place of `{SUBJECT}`.
//!
//! Labels are only replaced where they form a complete BIDS entity token
//! (`sub-<label>` or `ses-<label>`), so subject `1` is never rewritten inside
//! `sub-10`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SUBJECT_PLACEHOLDER: &str = "{SUBJECT}";
pub const SESSION_PLACEHOLDER: &str = "{SESSION}";
pub const GUID_PLACEHOLDER: &str = "{GUID}";

/// Replaces every `<key>-<label>` entity token in `path` with `<key>-<replacement>`.
///
/// A token only matches when it starts a path segment or follows `_`, and is
/// not followed by another alphanumeric character.
pub fn replace_entity_label(path: &str, key: &str, label: &str, replacement: &str) -> String {
    if label.is_empty() {
        return path.to_string();
    }
    let token = format!("{key}-{label}");
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut last = 0;
    for (start, _) in path.match_indices(&token) {
        if start < last {
            continue;
        }
        let end = start + token.len();
        let starts_token = start == 0 || matches!(bytes[start - 1], b'/' | b'_');
        let ends_token = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if !(starts_token && ends_token) {
            continue;
        }
        out.push_str(&path[last..start]);
        out.push_str(key);
        out.push('-');
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&path[last..]);
    out
}

/// Generalizes a concrete path into a template.
pub fn generalize(path: &str, subject: Option<&str>, session: Option<&str>) -> String {
    let mut template = path.to_string();
    if let Some(subject) = subject {
        template = replace_entity_label(&template, "sub", subject, SUBJECT_PLACEHOLDER);
    }
    if let Some(session) = session {
        template = replace_entity_label(&template, "ses", session, SESSION_PLACEHOLDER);
    }
    template
}

/// Derives the destination-side template for a source template.
pub fn destination_template(source: &str) -> String {
    source.replace(SUBJECT_PLACEHOLDER, GUID_PLACEHOLDER)
}

/// Concrete values for template placeholders, keyed by placeholder name
/// without braces (`SUBJECT`, `SESSION`, `GUID`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: BTreeMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Substitutes bound placeholders into a template. Unbound placeholders are left as-is.
pub fn bind(template: &str, bindings: &Bindings) -> String {
    let mut out = template.to_string();
    for (name, value) in bindings.iter() {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// Source template to destination template mapping, as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingDocument {
    entries: BTreeMap<String, String>,
}

impl MappingDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        self.entries.insert(source.into(), destination.into());
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for MappingDocument {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Mapping document for one datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatatypeMappingSet {
    pub datatype: String,
    pub document: MappingDocument,
}

impl DatatypeMappingSet {
    /// Builds the set from source templates, deriving each destination template.
    pub fn from_templates<I, S>(datatype: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let document = templates
            .into_iter()
            .map(|source| {
                let source = source.as_ref().to_string();
                let destination = destination_template(&source);
                (source, destination)
            })
            .collect();
        Self {
            datatype: datatype.into(),
            document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_subject_tokens_in_dirs_and_file_names() {
        let path = "sub-01/anat/sub-01_T1w.nii.gz";
        assert_eq!(
            replace_entity_label(path, "sub", "01", SUBJECT_PLACEHOLDER),
            "sub-{SUBJECT}/anat/sub-{SUBJECT}_T1w.nii.gz"
        );
    }

    #[test]
    fn nested_numeric_labels_are_not_rewritten() {
        let path = "sub-10/anat/sub-10_acq-1_T1w.nii.gz";
        assert_eq!(replace_entity_label(path, "sub", "1", SUBJECT_PLACEHOLDER), path);
        assert_eq!(
            replace_entity_label(path, "sub", "10", SUBJECT_PLACEHOLDER),
            "sub-{SUBJECT}/anat/sub-{SUBJECT}_acq-1_T1w.nii.gz"
        );
    }

    #[test]
    fn label_inside_other_entity_is_untouched() {
        // "01" also appears as the run label
        let path = "sub-01/pet/sub-01_run-01_pet.json";
        assert_eq!(
            generalize(path, Some("01"), None),
            "sub-{SUBJECT}/pet/sub-{SUBJECT}_run-01_pet.json"
        );
    }

    #[test]
    fn generalizes_sessions() {
        let path = "sub-01/ses-baseline/pet/sub-01_ses-baseline_pet.nii.gz";
        assert_eq!(
            generalize(path, Some("01"), Some("baseline")),
            "sub-{SUBJECT}/ses-{SESSION}/pet/sub-{SUBJECT}_ses-{SESSION}_pet.nii.gz"
        );
    }

    #[test]
    fn top_level_files_pass_through() {
        assert_eq!(generalize("README", Some("01"), None), "README");
    }

    #[test]
    fn destination_swaps_subject_for_guid() {
        assert_eq!(
            destination_template("sub-{SUBJECT}/ses-{SESSION}/anat/sub-{SUBJECT}_T1w.json"),
            "sub-{GUID}/ses-{SESSION}/anat/sub-{GUID}_T1w.json"
        );
    }

    #[test]
    fn bind_leaves_unbound_placeholders() {
        let bindings = Bindings::new().with("SUBJECT", "01");
        assert_eq!(
            bind("sub-{SUBJECT}/ses-{SESSION}", &bindings),
            "sub-01/ses-{SESSION}"
        );
    }

    #[test]
    fn mapping_set_derives_destinations() {
        let set = DatatypeMappingSet::from_templates(
            "anat",
            ["sub-{SUBJECT}/anat/sub-{SUBJECT}_T1w.nii.gz", "README"],
        );
        assert_eq!(set.document.len(), 2);
        assert_eq!(set.document.get("README"), Some("README"));
        assert_eq!(
            set.document.get("sub-{SUBJECT}/anat/sub-{SUBJECT}_T1w.nii.gz"),
            Some("sub-{GUID}/anat/sub-{GUID}_T1w.nii.gz")
        );
    }

    proptest! {
        #[test]
        fn guid_substitution_round_trips(guid in "[A-Za-z0-9]{1,16}") {
            let template = "sub-{GUID}/ses-{SESSION}/pet/sub-{GUID}_ses-{SESSION}_pet.nii.gz";
            let concrete = bind(template, &Bindings::new().with("GUID", guid.clone()));
            let rederived = replace_entity_label(&concrete, "sub", &guid, GUID_PLACEHOLDER);
            prop_assert_eq!(rederived, template);
        }
    }
}
