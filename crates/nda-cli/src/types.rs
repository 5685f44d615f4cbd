//! Result types and exit codes shared by the command handlers.

use std::path::PathBuf;

use nda_lookup::AgeUnit;
use nda_map::EmittedDocuments;
use nda_model::ParticipantRecord;
use nda_prepare::{PlacementMode, PrepareReport};

/// Process exit statuses.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    /// Bad destination or any other failure.
    pub const FAILURE: i32 = 1;
    pub const MISSING_MANIFEST_DIR: i32 = 2;
    pub const MISSING_MANIFEST_SCRIPT: i32 = 3;
    pub const BAD_SOURCE: i32 = 6;
    pub const MALFORMED_LABEL: i32 = 7;
}

#[derive(Debug)]
pub struct TemplatesResult {
    pub bids_dir: PathBuf,
    pub destination: PathBuf,
    pub generalized_sessions: bool,
    pub emitted: Vec<EmittedDocuments>,
}

#[derive(Debug)]
pub struct LookupResult {
    pub bids_dir: PathBuf,
    pub output: PathBuf,
    pub age_unit: Option<AgeUnit>,
    pub records: Vec<ParticipantRecord>,
}

#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub skip_filemapper: bool,
    pub manifest_dir: Option<PathBuf>,
    pub mode: PlacementMode,
}

#[derive(Debug)]
pub struct PrepareResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `None` when file mapping was skipped.
    pub report: Option<PrepareReport>,
}

impl PrepareResult {
    pub fn exit_code(&self) -> i32 {
        match &self.report {
            Some(report) if report.has_format_errors() => exit_code::MALFORMED_LABEL,
            Some(report) if report.failed().next().is_some() => exit_code::FAILURE,
            _ => exit_code::SUCCESS,
        }
    }
}
