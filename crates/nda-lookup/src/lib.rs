//! Lookup table construction for NDA uploads.
//!
//! A lookup table has one row per dataset file that lives in a datatype
//! directory. Each row carries the subject/session label and the demographic
//! values from `participants.tsv`, with ages converted to months. The
//! `subjectkey` column is left as `n/a` for the user to fill with NDA GUIDs
//! before files are placed.

mod error;
mod io;
mod table;
mod units;

pub use error::{LookupError, Result};
pub use io::{read_lookup_csv, write_lookup_csv};
pub use table::{LOOKUP_FILE_NAME, LookupTable};
pub use units::AgeUnit;
