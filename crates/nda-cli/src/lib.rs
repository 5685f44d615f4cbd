//! Library components of the `nda-bids-upload` command.

pub mod commands;
pub mod logging;
pub mod types;
