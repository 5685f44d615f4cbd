//! Command handlers behind each `nda-bids-upload` subcommand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, info_span};

use nda_ingest::BidsLayout;
use nda_lookup::{LOOKUP_FILE_NAME, LookupTable};
use nda_map::{
    MappingTemplator, TemplateEmitter, collect_dataset_templates, collect_from_path,
    default_upload_destination,
};
use nda_prepare::{PrepareError, Preparer};

use crate::types::{
    LookupResult, PrepareOptions, PrepareResult, TemplatesResult, exit_code,
};

/// Script expected inside `--manifest-dir`.
pub const MANIFEST_SCRIPT: &str = "nda_manifests.py";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("missing manifest directory {path}; clone it from https://github.com/NDAR/manifest-data")]
    MissingDirectory { path: PathBuf },

    #[error("missing NDA manifest script {path}")]
    MissingScript { path: PathBuf },
}

pub fn run_templates(
    bids_dir: &Path,
    destination: Option<&Path>,
    generalize_sessions: bool,
) -> Result<TemplatesResult> {
    let root = absolute(bids_dir);
    let span = info_span!("templates", dataset = %root.display());
    let _guard = span.enter();

    let layout = BidsLayout::open(&root).with_context(|| format!("index {}", root.display()))?;
    let emitter = match destination {
        Some(path) => TemplateEmitter::new(path),
        None => TemplateEmitter::for_dataset(&root),
    };

    let emitted = if generalize_sessions {
        let sets = collect_dataset_templates(&layout, None).to_mapping_sets();
        emitter.emit(&sets)
    } else {
        emitter.emit(MappingTemplator::new(&layout).mappings())
    }
    .context("write mapping documents")?;

    info!(documents = emitted.len(), "templates written");
    Ok(TemplatesResult {
        bids_dir: root,
        destination: emitter.destination().to_path_buf(),
        generalized_sessions: generalize_sessions,
        emitted,
    })
}

/// Dataset-wide templates as pretty JSON.
pub fn run_collect(bids_dir: &Path, destination: Option<&Path>) -> Result<String> {
    let collected = collect_from_path(bids_dir, destination)
        .with_context(|| format!("collect templates from {}", bids_dir.display()))?;
    serde_json::to_string_pretty(&collected).context("serialize collected templates")
}

pub fn run_lookup(bids_dir: &Path, output: Option<&Path>) -> Result<LookupResult> {
    let root = absolute(bids_dir);
    let span = info_span!("lookup", dataset = %root.display());
    let _guard = span.enter();

    let layout = BidsLayout::open(&root).with_context(|| format!("index {}", root.display()))?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_upload_destination(&root).join(LOOKUP_FILE_NAME));

    let mut table = LookupTable::with_destination(&layout, &output);
    table.write().context("write lookup table")?;

    Ok(LookupResult {
        bids_dir: root,
        output,
        age_unit: table.age_unit(),
        records: table.records().to_vec(),
    })
}

/// Validates the inputs in a fixed order, then places every mapping document.
///
/// Destination, manifest directory, manifest script and source are checked in
/// that order so the first problem found decides the exit status.
pub fn run_prepare(options: &PrepareOptions) -> Result<PrepareResult> {
    let span = info_span!("prepare", destination = %options.destination.display());
    let _guard = span.enter();

    if !options.destination.is_dir() {
        return Err(PrepareError::DestinationNotFound {
            path: options.destination.clone(),
        }
        .into());
    }
    if let Some(dir) = &options.manifest_dir {
        check_manifest_dir(dir)?;
    }
    let preparer =
        Preparer::new(&options.source, &options.destination)?.with_mode(options.mode);

    if options.skip_filemapper {
        info!("skipping file-mapping");
        return Ok(PrepareResult {
            source: options.source.clone(),
            destination: options.destination.clone(),
            report: None,
        });
    }

    let report = preparer.run().context("file-mapping")?;
    info!(
        documents = report.documents.len(),
        placed = report.total_placed(),
        "data prepared"
    );
    Ok(PrepareResult {
        source: options.source.clone(),
        destination: options.destination.clone(),
        report: Some(report),
    })
}

fn check_manifest_dir(dir: &Path) -> Result<(), ManifestError> {
    if !dir.is_dir() {
        return Err(ManifestError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    let script = dir.join(MANIFEST_SCRIPT);
    if !script.is_file() {
        return Err(ManifestError::MissingScript { path: script });
    }
    Ok(())
}

/// Maps a command failure to its process exit status.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(manifest) = cause.downcast_ref::<ManifestError>() {
            return match manifest {
                ManifestError::MissingDirectory { .. } => exit_code::MISSING_MANIFEST_DIR,
                ManifestError::MissingScript { .. } => exit_code::MISSING_MANIFEST_SCRIPT,
            };
        }
        if let Some(prepare) = cause.downcast_ref::<PrepareError>() {
            return match prepare {
                PrepareError::SourceNotFound { .. } => exit_code::BAD_SOURCE,
                error if error.is_format_error() => exit_code::MALFORMED_LABEL,
                _ => exit_code::FAILURE,
            };
        }
    }
    exit_code::FAILURE
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
