//! Placement over an upload directory with mapping documents and a filled lookup table.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use nda_model::ParticipantRecord;
use nda_prepare::{
    FilePlacer, PlacementError, PlacementMode, PlacementOutcome, PlacementRequest, PrepareError,
    Preparer, TemplateScope,
};
use tempfile::TempDir;

const LOOKUP_HEADER: &str =
    "bids_subject_session,subjectkey,src_subject_id,interview_date,interview_age,sex,datatype\n";

struct Workspace {
    _dir: TempDir,
    source: PathBuf,
    destination: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("ds");
    let destination = dir.path().join("ds_nda_upload");
    for subject in ["01", "02"] {
        for session in ["baseline", "rescan"] {
            let pet = source.join(format!("sub-{subject}/ses-{session}/pet"));
            std::fs::create_dir_all(&pet).unwrap();
            let stem = format!("sub-{subject}_ses-{session}_pet");
            std::fs::write(pet.join(format!("{stem}.json")), "{}").unwrap();
            std::fs::write(pet.join(format!("{stem}.nii.gz")), "").unwrap();
        }
    }
    std::fs::write(source.join("README"), "readme").unwrap();
    std::fs::create_dir_all(&destination).unwrap();
    Workspace {
        _dir: dir,
        source,
        destination,
    }
}

fn write_json(path: &Path, pairs: &[(&str, &str)]) {
    let map: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect();
    std::fs::write(path, serde_json::to_string_pretty(&map).unwrap()).unwrap();
}

fn pet_session_document(destination: &Path) {
    write_json(
        &destination.join("image03_sourcedata.pet.pet.json"),
        &[
            (
                "sub-{SUBJECT}/ses-{SESSION}/pet/sub-{SUBJECT}_ses-{SESSION}_pet.json",
                "sub-{GUID}/ses-{SESSION}/pet/sub-{GUID}_ses-{SESSION}_pet.json",
            ),
            (
                "sub-{SUBJECT}/ses-{SESSION}/pet/sub-{SUBJECT}_ses-{SESSION}_pet.nii.gz",
                "sub-{GUID}/ses-{SESSION}/pet/sub-{GUID}_ses-{SESSION}_pet.nii.gz",
            ),
        ],
    );
}

fn write_lookup(destination: &Path, rows: &[&str]) {
    let mut text = LOOKUP_HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    std::fs::write(destination.join("lookup.csv"), text).unwrap();
}

#[cfg(unix)]
#[test]
fn session_document_links_files_per_subject_session() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    write_lookup(
        &ws.destination,
        &[
            "sub-01_ses-baseline,NDAR_INV0001,sub-01,n/a,258.1,F,pet",
            "sub-01_ses-baseline,NDAR_INV0001,sub-01,n/a,258.1,F,pet",
            "sub-02_ses-rescan,NDARINV0002,sub-02,n/a,360,M,pet",
            "sub-02,NDARINV0002,sub-02,n/a,360,M,pet",
        ],
    );

    let report = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.documents.len(), 1);
    let document = &report.documents[0];
    assert!(document.is_ok());
    assert_eq!(document.scope, Some(TemplateScope::SessionRequired));
    assert_eq!(document.matched, 2);
    assert_eq!(document.placed, 2);
    assert_eq!(document.files, 4);

    let link = ws.destination.join(
        "image03_sourcedata.pet.pet/sub-NDARINV0001_ses-baseline.sourcedata.pet.pet/\
         sub-NDARINV0001/ses-baseline/pet/sub-NDARINV0001_ses-baseline_pet.nii.gz",
    );
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(
        std::fs::read_link(&link).unwrap(),
        std::path::absolute(
            ws.source
                .join("sub-01/ses-baseline/pet/sub-01_ses-baseline_pet.nii.gz")
        )
        .unwrap()
    );
    assert!(
        !ws.destination
            .join("image03_sourcedata.pet.pet/sub-NDARINV0002.sourcedata.pet.pet")
            .exists()
    );
}

#[test]
fn rerunning_is_idempotent() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    write_lookup(
        &ws.destination,
        &["sub-01_ses-baseline,NDARINV0001,sub-01,n/a,n/a,F,pet"],
    );

    let preparer = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .with_mode(PlacementMode::Copy);
    let first = preparer.run().unwrap();
    let second = preparer.run().unwrap();

    assert_eq!(first.total_files(), 2);
    assert_eq!(second.total_files(), 0);
    assert_eq!(second.total_placed(), 1);
    assert!(second.failed().next().is_none());
}

#[test]
fn rows_without_subjectkey_are_skipped() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    write_lookup(
        &ws.destination,
        &[
            "sub-01_ses-baseline,n/a,sub-01,n/a,n/a,F,pet",
            "sub-02_ses-baseline,NDARINV0002,sub-02,n/a,n/a,M,pet",
        ],
    );

    let report = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .with_mode(PlacementMode::Copy)
        .run()
        .unwrap();
    assert_eq!(report.documents[0].skipped, 1);
    assert_eq!(report.documents[0].placed, 1);
}

#[test]
fn directories_without_subdirectories_are_removed() {
    let ws = workspace();
    write_json(
        &ws.destination.join("image03_sourcedata.anat.anat.json"),
        &[("README", "README")],
    );
    write_lookup(
        &ws.destination,
        &["sub-01,NDARINV0001,sub-01,n/a,n/a,F,anat"],
    );

    let report = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .with_mode(PlacementMode::Copy)
        .run()
        .unwrap();
    let document = &report.documents[0];
    assert_eq!(document.scope, Some(TemplateScope::SubjectOnly));
    assert_eq!(document.removed_empty, 1);
    assert_eq!(document.placed, 0);
    assert!(
        !ws.destination
            .join("image03_sourcedata.anat.anat/sub-NDARINV0001.sourcedata.anat.anat")
            .exists()
    );
}

#[test]
fn malformed_label_aborts_each_document_but_not_the_run() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    write_json(
        &ws.destination.join("image03_sourcedata.anat.anat.json"),
        &[("README", "README")],
    );
    write_lookup(
        &ws.destination,
        &["sub-01_baseline,NDARINV0001,sub-01,n/a,n/a,F,pet"],
    );

    let report = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.documents.len(), 2);
    assert!(report.has_format_errors());
    assert!(matches!(
        report.documents[0].error,
        Some(PrepareError::MalformedLabel(_))
    ));
}

#[test]
fn document_name_without_underscore_is_a_format_error() {
    let ws = workspace();
    write_json(&ws.destination.join("mapping.json"), &[("README", "README")]);
    write_lookup(&ws.destination, &[]);

    let report = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .run()
        .unwrap();
    assert!(matches!(
        report.documents[0].error,
        Some(PrepareError::MalformedDocumentName { .. })
    ));
}

#[test]
fn roots_are_validated_destination_first() {
    let ws = workspace();
    let missing = ws.destination.join("absent");

    let err = Preparer::new(&missing, &missing).unwrap_err();
    assert!(matches!(err, PrepareError::DestinationNotFound { .. }));

    let err = Preparer::new(&missing, &ws.destination).unwrap_err();
    assert!(matches!(err, PrepareError::SourceNotFound { .. }));
}

#[test]
fn missing_lookup_table_fails_the_run() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    let err = Preparer::new(&ws.source, &ws.destination)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("lookup.csv"));
}

#[derive(Default)]
struct RecordingPlacer {
    calls: RefCell<Vec<(PathBuf, Option<String>, Option<String>)>>,
}

impl FilePlacer for RecordingPlacer {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementOutcome, PlacementError> {
        self.calls.borrow_mut().push((
            request.destination.to_path_buf(),
            request.bindings.get("SESSION").map(str::to_string),
            request.bindings.get("GUID").map(str::to_string),
        ));
        assert_eq!(request.mode, PlacementMode::Symlink);
        assert!(!request.overwrite);
        std::fs::create_dir_all(request.destination.join("sub-x")).unwrap();
        Ok(PlacementOutcome {
            placed: 1,
            ..PlacementOutcome::default()
        })
    }
}

#[test]
fn placer_receives_bindings_for_each_row() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    let records = vec![
        ParticipantRecord::new("01", Some("baseline"), "pet").with_subjectkey("NDAR_INV0001"),
        ParticipantRecord::new("02", Some("rescan"), "pet").with_subjectkey("NDARINV0002"),
    ];

    let preparer =
        Preparer::with_placer(&ws.source, &ws.destination, RecordingPlacer::default()).unwrap();
    let report = preparer.run_with_records(&records).unwrap();
    assert_eq!(report.total_placed(), 2);
    assert_eq!(report.total_files(), 2);

    let calls = preparer.placer().calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].0.ends_with(
        "image03_sourcedata.pet.pet/sub-NDARINV0001_ses-baseline.sourcedata.pet.pet"
    ));
    assert_eq!(calls[0].1.as_deref(), Some("baseline"));
    assert_eq!(calls[0].2.as_deref(), Some("NDARINV0001"));
    assert_eq!(calls[1].1.as_deref(), Some("rescan"));
}

/// Fails every placement for one subject label and places a subdirectory for the rest.
struct FailingPlacer {
    failing_guid: &'static str,
}

impl FilePlacer for FailingPlacer {
    fn place(&self, request: &PlacementRequest<'_>) -> Result<PlacementOutcome, PlacementError> {
        if request.bindings.get("GUID") == Some(self.failing_guid) {
            return Err(PlacementError::Link {
                source_path: request.source_root.join("missing"),
                destination: request.destination.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        std::fs::create_dir_all(request.destination.join("sub-x")).unwrap();
        Ok(PlacementOutcome {
            placed: 1,
            ..PlacementOutcome::default()
        })
    }
}

#[test]
fn failed_placement_skips_the_row_and_leaves_no_directory() {
    let ws = workspace();
    pet_session_document(&ws.destination);
    let records = vec![
        ParticipantRecord::new("01", Some("baseline"), "pet").with_subjectkey("NDARINV0001"),
        ParticipantRecord::new("02", Some("rescan"), "pet").with_subjectkey("NDARINV0002"),
    ];

    let preparer = Preparer::with_placer(
        &ws.source,
        &ws.destination,
        FailingPlacer {
            failing_guid: "NDARINV0001",
        },
    )
    .unwrap();
    let report = preparer.run_with_records(&records).unwrap();

    let document = &report.documents[0];
    assert!(document.is_ok());
    assert_eq!(document.skipped, 1);
    assert_eq!(document.placed, 1);

    let parent = ws.destination.join("image03_sourcedata.pet.pet");
    assert!(
        !parent
            .join("sub-NDARINV0001_ses-baseline.sourcedata.pet.pet")
            .exists()
    );
    assert!(
        parent
            .join("sub-NDARINV0002_ses-rescan.sourcedata.pet.pet/sub-x")
            .is_dir()
    );
}
