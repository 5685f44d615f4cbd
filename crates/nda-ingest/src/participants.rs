//! Participants table (`participants.tsv`) and its sidecar (`participants.json`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nda_model::FileQuery;
use polars::prelude::*;
use serde_json::{Map, Value};

use crate::error::{IngestError, Result};
use crate::index::DatasetIndex;

pub const PARTICIPANTS_TSV: &str = "participants.tsv";
pub const PARTICIPANTS_JSON: &str = "participants.json";

const PARTICIPANT_ID: &str = "participant_id";
const AGE: &str = "age";
const SEX: &str = "sex";
const GENDER: &str = "gender";

/// Demographic values for one participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demographics {
    pub age: Option<f64>,
    pub sex: Option<String>,
}

/// Field descriptions from `participants.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantsSidecar {
    fields: Map<String, Value>,
}

impl ParticipantsSidecar {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        let value: Value =
            serde_json::from_str(&text).map_err(|e| IngestError::SidecarParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(IngestError::SidecarFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Declared `age.Units`, or an empty string when absent.
    pub fn age_units(&self) -> &str {
        self.fields
            .get(AGE)
            .and_then(|age| age.get("Units"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Finds a field by case-insensitive name, returning its actual key.
    pub fn find_field(&self, name: &str) -> Option<String> {
        self.fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Moves the description stored under `from` to `to`. Returns false if `from` is absent.
    pub fn rename_field(&mut self, from: &str, to: &str) -> bool {
        match self.fields.remove(from) {
            Some(value) => {
                self.fields.insert(to.to_string(), value);
                true
            }
            None => false,
        }
    }
}

/// The demographic table loaded with Polars.
#[derive(Debug, Clone)]
pub struct ParticipantsTable {
    path: PathBuf,
    frame: DataFrame,
}

impl ParticipantsTable {
    /// Reads a tab-separated participants table; `n/a` cells become null.
    ///
    /// Column types are inferred from every row.
    pub fn load(path: &Path) -> Result<Self> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|options| {
                options
                    .with_separator(b'\t')
                    .with_null_values(Some(NullValues::AllColumnsSingle("n/a".into())))
            })
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| IngestError::TableParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .finish()
            .map_err(|e| IngestError::TableParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "loaded participants table"
        );

        Ok(Self::from_frame(path, frame))
    }

    pub fn from_frame(path: impl Into<PathBuf>, frame: DataFrame) -> Self {
        Self {
            path: path.into(),
            frame,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Finds a column by case-insensitive name, returning its actual name.
    pub fn find_column(&self, name: &str) -> Option<String> {
        self.column_names()
            .into_iter()
            .find(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        self.frame.rename(from, to.into())?;
        Ok(())
    }

    /// Demographics keyed by subject label (the `participant_id` without `sub-`).
    pub fn demographics(&self) -> Result<BTreeMap<String, Demographics>> {
        let id_name = self
            .find_column(PARTICIPANT_ID)
            .ok_or_else(|| IngestError::MissingColumn {
                column: PARTICIPANT_ID.to_string(),
                path: self.path.clone(),
            })?;
        let ids = string_values(self.frame.column(&id_name)?)?;
        let ages = match self.find_column(AGE) {
            Some(name) => float_values(self.frame.column(&name)?)?,
            None => vec![None; ids.len()],
        };
        let sexes = match self.find_column(SEX) {
            Some(name) => string_values(self.frame.column(&name)?)?,
            None => vec![None; ids.len()],
        };

        let mut out = BTreeMap::new();
        for ((id, age), sex) in ids.into_iter().zip(ages).zip(sexes) {
            let Some(id) = id else {
                continue;
            };
            let subject = id.strip_prefix("sub-").unwrap_or(&id).to_string();
            out.entry(subject).or_insert(Demographics { age, sex });
        }
        Ok(out)
    }
}

fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let str_col = column.cast(&DataType::String)?;
    let values = str_col
        .str()?
        .iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn float_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let float_col = column.cast(&DataType::Float64)?;
    Ok(float_col.f64()?.iter().collect())
}

/// Participants table and sidecar for one dataset.
#[derive(Debug, Clone)]
pub struct Participants {
    pub table: ParticipantsTable,
    pub sidecar: ParticipantsSidecar,
}

impl Participants {
    /// Loads both participants files, failing if either is absent.
    pub fn load<I: DatasetIndex + ?Sized>(index: &I) -> Result<Self> {
        let tsv_path = locate_participants_file(index, ".tsv", PARTICIPANTS_TSV)?;
        let json_path = locate_participants_file(index, ".json", PARTICIPANTS_JSON)?;
        let table = ParticipantsTable::load(&tsv_path)?;
        let sidecar = ParticipantsSidecar::load(&json_path)?;
        Ok(Self { table, sidecar })
    }

    /// Renames a `gender` column (any case) to `sex` in the table and sidecar.
    ///
    /// Returns true if a rename happened. A table that already has `sex` is left alone.
    pub fn normalize_sex_column(&mut self) -> Result<bool> {
        if self.table.find_column(SEX).as_deref() == Some(SEX) {
            return Ok(false);
        }
        let Some(gender) = self.table.find_column(GENDER) else {
            return Ok(false);
        };
        self.table.rename_column(&gender, SEX)?;
        match self.sidecar.find_field(GENDER) {
            Some(key) => {
                self.sidecar.rename_field(&key, SEX);
            }
            None => tracing::debug!("participants sidecar has no gender entry"),
        }
        tracing::debug!(from = %gender, "renamed participants column to sex");
        Ok(true)
    }
}

/// Locates a top-level participants file through the index, falling back to the root.
pub fn locate_participants_file<I: DatasetIndex + ?Sized>(
    index: &I,
    extension: &str,
    file_name: &str,
) -> Result<PathBuf> {
    let indexed = index
        .files_for(
            &FileQuery::new()
                .suffix("participants")
                .extension(extension),
        )
        .into_iter()
        .find(|file| file.relpath == file_name)
        .map(|file| index.root().join(&file.relpath));
    let path = indexed.unwrap_or_else(|| index.root().join(file_name));
    if path.is_file() {
        Ok(path)
    } else {
        Err(IngestError::MissingInput { path })
    }
}

fn read_error(path: &Path, e: std::io::Error) -> IngestError {
    if e.kind() == std::io::ErrorKind::NotFound {
        IngestError::MissingInput {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
    }
}
