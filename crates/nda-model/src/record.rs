//! Lookup table records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Placeholder written for blank or unresolved lookup cells.
pub const MISSING_VALUE: &str = "n/a";

/// Lookup table header, in output order.
pub const LOOKUP_COLUMNS: [&str; 7] = [
    "bids_subject_session",
    "subjectkey",
    "src_subject_id",
    "interview_date",
    "interview_age",
    "sex",
    "datatype",
];

/// One row of the lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// `sub-<subject>` or `sub-<subject>_ses-<session>`.
    pub bids_subject_session: String,
    /// NDA GUID, resolved outside this tool.
    pub subjectkey: Option<String>,
    pub src_subject_id: String,
    pub interview_date: Option<String>,
    /// Age in months.
    pub interview_age: Option<f64>,
    pub sex: Option<String>,
    pub datatype: String,
}

impl ParticipantRecord {
    pub fn new(subject: &str, session: Option<&str>, datatype: impl Into<String>) -> Self {
        let label = SubjectSession::new(subject, session);
        Self {
            bids_subject_session: label.to_string(),
            subjectkey: None,
            src_subject_id: format!("sub-{subject}"),
            interview_date: None,
            interview_age: None,
            sex: None,
            datatype: datatype.into(),
        }
    }

    #[must_use]
    pub fn with_age(mut self, months: Option<f64>) -> Self {
        self.interview_age = months;
        self
    }

    #[must_use]
    pub fn with_sex(mut self, sex: Option<String>) -> Self {
        self.sex = sex;
        self
    }

    #[must_use]
    pub fn with_subjectkey(mut self, subjectkey: impl Into<String>) -> Self {
        self.subjectkey = Some(subjectkey.into());
        self
    }

    /// Parses the composite subject/session label.
    pub fn subject_session(&self) -> Result<SubjectSession> {
        self.bids_subject_session.parse()
    }

    /// The subject key with underscores stripped, if one has been resolved.
    pub fn guid(&self) -> Option<String> {
        let guid = self.subjectkey.as_deref()?.replace('_', "");
        let guid = guid.trim();
        if guid.is_empty() {
            None
        } else {
            Some(guid.to_string())
        }
    }

    /// Cells in [`LOOKUP_COLUMNS`] order with blanks rendered as [`MISSING_VALUE`].
    pub fn to_row(&self) -> [String; 7] {
        [
            self.bids_subject_session.clone(),
            or_missing(self.subjectkey.as_deref()),
            self.src_subject_id.clone(),
            or_missing(self.interview_date.as_deref()),
            self.interview_age
                .map(|age| age.to_string())
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
            or_missing(self.sex.as_deref()),
            or_missing(Some(self.datatype.as_str())),
        ]
    }
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Parsed `bids_subject_session` label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectSession {
    pub subject: String,
    pub session: Option<String>,
}

impl SubjectSession {
    pub fn new(subject: &str, session: Option<&str>) -> Self {
        Self {
            subject: subject.to_string(),
            session: session.map(str::to_string),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// `ses-<session>` if a session is present.
    pub fn session_dir(&self) -> Option<String> {
        self.session.as_ref().map(|s| format!("ses-{s}"))
    }
}

impl fmt::Display for SubjectSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.subject)?;
        if let Some(session) = &self.session {
            write!(f, "_ses-{session}")?;
        }
        Ok(())
    }
}

impl FromStr for SubjectSession {
    type Err = ModelError;

    fn from_str(label: &str) -> Result<Self> {
        let malformed = |reason: &str| ModelError::MalformedLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        };
        if label.matches('_').count() > 1 {
            return Err(malformed(
                "requires no more than one \"_\" (underscore)",
            ));
        }
        let (subject_part, session) = match label.split_once('_') {
            Some((subject_part, rest)) => {
                let session = rest
                    .strip_prefix("ses-")
                    .ok_or_else(|| malformed("requires \"_ses-\" between subject and session"))?;
                if session.is_empty() {
                    return Err(malformed("session label is empty"));
                }
                (subject_part, Some(session))
            }
            None => (label, None),
        };
        let subject = subject_part
            .strip_prefix("sub-")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("requires a \"sub-\" prefix"))?;
        Ok(Self::new(subject, session))
    }
}
