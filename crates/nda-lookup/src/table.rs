//! Lookup table construction from the dataset index and participants files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nda_ingest::{DatasetIndex, Demographics, Participants};
use nda_model::{FileQuery, ParticipantRecord};

use crate::error::{LookupError, Result};
use crate::io::write_lookup_csv;
use crate::units::AgeUnit;

/// File name of the lookup table inside an upload directory.
pub const LOOKUP_FILE_NAME: &str = "lookup.csv";

/// One record per indexed file carrying a datatype, with demographics joined in.
///
/// The table is built at most once; a failed build leaves it empty.
#[derive(Debug)]
pub struct LookupTable<'a, I: DatasetIndex + ?Sized> {
    index: &'a I,
    destination: PathBuf,
    records: Vec<ParticipantRecord>,
    age_unit: Option<AgeUnit>,
}

impl<'a, I: DatasetIndex + ?Sized> LookupTable<'a, I> {
    /// Table for `index`, written to `<directory>/lookup.csv`.
    pub fn new(index: &'a I, directory: &Path) -> Self {
        Self::with_destination(index, directory.join(LOOKUP_FILE_NAME))
    }

    /// Table for `index`, written to an explicit file path.
    pub fn with_destination(index: &'a I, destination: impl Into<PathBuf>) -> Self {
        Self {
            index,
            destination: destination.into(),
            records: Vec::new(),
            age_unit: None,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn records(&self) -> &[ParticipantRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unit the participants ages were declared in, once built.
    pub fn age_unit(&self) -> Option<AgeUnit> {
        self.age_unit
    }

    /// Loads the participants files and materializes the records.
    pub fn build(&mut self) -> Result<&[ParticipantRecord]> {
        if !self.records.is_empty() {
            return Ok(&self.records);
        }

        let mut participants = Participants::load(self.index)?;
        participants.normalize_sex_column()?;

        let unit = AgeUnit::infer(participants.sidecar.age_units());
        if unit == AgeUnit::Unknown {
            tracing::warn!(
                units = participants.sidecar.age_units(),
                "unable to determine participant.age.Units from {}, not converting to months",
                participants.table.path().display()
            );
        }

        let demographics = participants.table.demographics()?;
        let records = collect_records(self.index, &demographics, unit, participants.table.path())?;

        tracing::info!(
            records = records.len(),
            age_unit = %unit,
            "built lookup table"
        );
        self.records = records;
        self.age_unit = Some(unit);
        Ok(&self.records)
    }

    /// Writes the table as CSV, building it first if needed.
    pub fn write(&mut self) -> Result<&Path> {
        self.build()?;
        write_lookup_csv(&self.destination, &self.records)?;
        tracing::info!(path = %self.destination.display(), "wrote lookup table");
        Ok(&self.destination)
    }
}

fn collect_records<I: DatasetIndex + ?Sized>(
    index: &I,
    demographics: &BTreeMap<String, Demographics>,
    unit: AgeUnit,
    table: &Path,
) -> Result<Vec<ParticipantRecord>> {
    let mut records = Vec::new();
    for subject in index.subjects() {
        let Some(demographic) = demographics.get(&subject) else {
            return Err(LookupError::UnknownSubject {
                subject,
                table: table.to_path_buf(),
            });
        };
        let age = demographic.age.map(|age| unit.to_months(age));

        for file in index.files_for(&FileQuery::new().subject(&subject)) {
            let Some(datatype) = file.datatype() else {
                continue;
            };
            records.push(
                ParticipantRecord::new(&subject, file.session(), datatype)
                    .with_age(age)
                    .with_sex(demographic.sex.clone()),
            );
        }
    }
    Ok(records)
}
