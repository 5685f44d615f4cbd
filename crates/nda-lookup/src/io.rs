//! CSV persistence for lookup tables.

use std::path::Path;

use nda_model::{LOOKUP_COLUMNS, MISSING_VALUE, ParticipantRecord};

use crate::error::{LookupError, Result};

/// Writes the header and one row per record. No index column is emitted.
pub fn write_lookup_csv(path: &Path, records: &[ParticipantRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| LookupError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let write_err = |e: csv::Error| LookupError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(LOOKUP_COLUMNS).map_err(write_err)?;
    for record in records {
        writer.write_record(record.to_row()).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;
    Ok(())
}

/// Reads a lookup table, typically one a user has filled with subject keys.
///
/// Blank and `n/a` cells read as absent. Only `bids_subject_session` is required.
pub fn read_lookup_csv(path: &Path) -> Result<Vec<ParticipantRecord>> {
    let read_err = |e: csv::Error| LookupError::Read {
        path: path.to_path_buf(),
        source: e,
    };
    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();
    let position = |column: &str| headers.iter().position(|h| h.trim() == column);

    let label_idx = position("bids_subject_session").ok_or_else(|| LookupError::MissingColumn {
        column: "bids_subject_session".to_string(),
        path: path.to_path_buf(),
    })?;
    let subjectkey_idx = position("subjectkey");
    let src_idx = position("src_subject_id");
    let date_idx = position("interview_date");
    let age_idx = position("interview_age");
    let sex_idx = position("sex");
    let datatype_idx = position("datatype");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(read_err)?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != MISSING_VALUE)
                .map(str::to_string)
        };

        let Some(label) = cell(Some(label_idx)) else {
            continue;
        };
        let interview_age = match cell(age_idx) {
            Some(value) => Some(value.parse::<f64>().map_err(|_| LookupError::InvalidValue {
                column: "interview_age".to_string(),
                value,
                path: path.to_path_buf(),
            })?),
            None => None,
        };
        let src_subject_id = cell(src_idx).unwrap_or_else(|| {
            label
                .split('_')
                .next()
                .unwrap_or(label.as_str())
                .to_string()
        });

        records.push(ParticipantRecord {
            bids_subject_session: label,
            subjectkey: cell(subjectkey_idx),
            src_subject_id,
            interview_date: cell(date_idx),
            interview_age,
            sex: cell(sex_idx),
            datatype: cell(datatype_idx).unwrap_or_default(),
        });
    }
    Ok(records)
}
