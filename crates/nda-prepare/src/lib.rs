//! Session-aware placement of dataset files into NDA upload directories.
//!
//! For every mapping document in an upload directory the [`Preparer`]
//! decides whether the document needs sessions, keeps the matching
//! `lookup.csv` rows, and asks a [`FilePlacer`] to realize the mapping under
//! `<destination>/<document>/sub-<guid>[_ses-<session>].<tail>/`.
//!
//! # Example
//!
//! ```ignore
//! use nda_prepare::{PlacementMode, Preparer};
//!
//! let report = Preparer::new("data/ds004869", "data/ds004869_nda_upload")?
//!     .with_mode(PlacementMode::Symlink)
//!     .run()?;
//! assert!(!report.has_format_errors());
//! ```

mod error;
mod naming;
mod placer;
mod preparer;
mod report;
mod scope;

pub use error::{PlacementError, PrepareError, Result};
pub use naming::DocumentName;
pub use placer::{FileMapper, FilePlacer, PlacementMode, PlacementOutcome, PlacementRequest};
pub use preparer::Preparer;
pub use report::{DocumentReport, PrepareReport};
pub use scope::{ScopedRecord, TemplateScope, filter_records};
