//! BIDS dataset ingestion.
//!
//! This crate indexes a BIDS dataset once into an immutable [`BidsLayout`]
//! and loads the participants table and its sidecar.
//!
//! # Features
//!
//! - **Dataset Index**: the [`DatasetIndex`] seam plus a filesystem walker
//! - **Entity Parsing**: subject, session, datatype, suffix and extension from paths
//! - **Participants**: `participants.tsv` via Polars and `participants.json` via serde_json
//!
//! # Example
//!
//! ```ignore
//! use nda_ingest::{BidsLayout, DatasetIndex, Participants};
//!
//! let layout = BidsLayout::open("data/ds004869")?;
//! let subjects = layout.subjects();
//! let mut participants = Participants::load(&layout)?;
//! participants.normalize_sex_column()?;
//! ```

mod error;
mod index;
mod layout;
mod participants;

// === Error Types ===
pub use error::{IngestError, Result};

// === Dataset Index ===
pub use index::DatasetIndex;
pub use layout::{BIDS_DATATYPES, BidsLayout, parse_entities};

// === Participants ===
pub use participants::{
    Demographics, PARTICIPANTS_JSON, PARTICIPANTS_TSV, Participants, ParticipantsSidecar,
    ParticipantsTable, locate_participants_file,
};
