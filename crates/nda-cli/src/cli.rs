//! CLI argument definitions for the NDA upload preparation tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "nda-bids-upload",
    version,
    about = "Prepare a BIDS dataset for upload to the NIMH Data Archive",
    long_about = "Prepare a BIDS dataset for upload to the NIMH Data Archive.\n\n\
                  Generates image03 file-mapping templates and a subject/session\n\
                  lookup table, then links dataset files into per-subject upload\n\
                  directories once the lookup table has been filled with GUIDs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write image03 mapping documents and descriptors for each datatype.
    Templates(TemplatesArgs),

    /// Print the dataset-wide templates grouped by datatype as JSON.
    Collect(CollectArgs),

    /// Build the subject/session lookup table from participants.tsv.
    Lookup(LookupArgs),

    /// Link or copy dataset files into upload directories using lookup.csv.
    Prepare(PrepareArgs),
}

#[derive(Parser)]
pub struct TemplatesArgs {
    /// Path to the BIDS dataset root.
    #[arg(value_name = "BIDS_DIR")]
    pub bids_dir: PathBuf,

    /// Output directory (default: <BIDS_DIR>_nda_upload next to the dataset).
    #[arg(long = "destination", short = 'd', value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Replace session labels with {SESSION} and include top-level files.
    #[arg(long = "generalize-sessions")]
    pub generalize_sessions: bool,
}

#[derive(Parser)]
pub struct CollectArgs {
    /// Path to the BIDS dataset root.
    #[arg(value_name = "BIDS_DIR")]
    pub bids_dir: PathBuf,

    /// Filemapped dataset path recorded in the output (default: <BIDS_DIR>.nda).
    #[arg(long = "destination", short = 'd', value_name = "DIR")]
    pub destination: Option<PathBuf>,
}

#[derive(Parser)]
pub struct LookupArgs {
    /// Path to the BIDS dataset root.
    #[arg(value_name = "BIDS_DIR")]
    pub bids_dir: PathBuf,

    /// Lookup file to write (default: <BIDS_DIR>_nda_upload/lookup.csv).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct PrepareArgs {
    /// Directory the files are sourced from (the BIDS dataset).
    #[arg(
        long = "source",
        short = 's',
        visible_alias = "target",
        visible_short_alias = 't',
        value_name = "SOURCE"
    )]
    pub source: PathBuf,

    /// Directory holding the mapping documents and lookup.csv.
    #[arg(long = "destination", short = 'd', value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Skip file mapping (only use if it has already been done).
    #[arg(long = "skip-filemapper", short = 'k')]
    pub skip_filemapper: bool,

    /// Directory containing the NDA manifest script (nda_manifests.py).
    #[arg(long = "manifest-dir", value_name = "DIR")]
    pub manifest_dir: Option<PathBuf>,

    /// Copy files instead of symlinking them.
    #[arg(long = "copy")]
    pub copy: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
