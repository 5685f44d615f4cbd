//! Command-level tests: templates, lookup and prepare over one dataset.

use std::path::{Path, PathBuf};

use nda_cli::commands::{
    MANIFEST_SCRIPT, exit_code_for, run_collect, run_lookup, run_prepare, run_templates,
};
use nda_cli::types::{PrepareOptions, exit_code};
use nda_prepare::PlacementMode;
use tempfile::TempDir;

const PARTICIPANTS_TSV: &str = "participant_id\tage\tgender\n\
                                sub-01\t21.5086\tF\n\
                                sub-02\t30\tM\n";
const PARTICIPANTS_JSON: &str = r#"{"age": {"Units": "years"}, "gender": {"LongName": "gender"}}"#;

struct Fixture {
    _dir: TempDir,
    bids: PathBuf,
    upload: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let bids = dir.path().join("ds004869");
    for subject in ["01", "02"] {
        for session in ["baseline", "rescan"] {
            for (datatype, suffix) in [("anat", "T1w"), ("pet", "pet")] {
                let folder = bids.join(format!("sub-{subject}/ses-{session}/{datatype}"));
                std::fs::create_dir_all(&folder).unwrap();
                let stem = format!("sub-{subject}_ses-{session}_{suffix}");
                std::fs::write(folder.join(format!("{stem}.json")), "{}").unwrap();
                std::fs::write(folder.join(format!("{stem}.nii.gz")), "").unwrap();
            }
        }
    }
    std::fs::write(bids.join("participants.tsv"), PARTICIPANTS_TSV).unwrap();
    std::fs::write(bids.join("participants.json"), PARTICIPANTS_JSON).unwrap();
    std::fs::write(bids.join("dataset_description.json"), "{}").unwrap();
    let upload = dir.path().join("ds004869_nda_upload");
    Fixture {
        _dir: dir,
        bids,
        upload,
    }
}

fn options(source: &Path, destination: &Path) -> PrepareOptions {
    PrepareOptions {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        skip_filemapper: false,
        manifest_dir: None,
        mode: PlacementMode::Symlink,
    }
}

fn fill_subject_keys(lookup: &Path) {
    let text = std::fs::read_to_string(lookup)
        .unwrap()
        .replace(",n/a,sub-01,", ",NDAR_INV0001,sub-01,")
        .replace(",n/a,sub-02,", ",NDAR_INV0002,sub-02,");
    std::fs::write(lookup, text).unwrap();
}

#[test]
fn templates_default_to_a_sibling_upload_directory() {
    let fx = fixture();
    let result = run_templates(&fx.bids, None, false).unwrap();

    assert_eq!(result.destination, fx.upload);
    let datatypes: Vec<&str> = result.emitted.iter().map(|e| e.datatype.as_str()).collect();
    assert_eq!(datatypes, vec!["anat", "pet"]);
    assert!(fx.upload.join("image03_sourcedata.anat.anat.json").is_file());
    assert!(fx.upload.join("image03_sourcedata.pet.pet.yaml").is_file());

    // Session literals survive the per-subject pass.
    let anat = std::fs::read_to_string(fx.upload.join("image03_sourcedata.anat.anat.json")).unwrap();
    assert!(anat.contains("ses-baseline"));
    assert!(!anat.contains("{SESSION}"));
}

#[test]
fn unsupported_datatype_fails_with_general_exit_code() {
    let fx = fixture();
    let func = fx.bids.join("sub-01/ses-baseline/func");
    std::fs::create_dir_all(&func).unwrap();
    std::fs::write(func.join("sub-01_ses-baseline_task-rest_bold.json"), "{}").unwrap();

    let err = run_templates(&fx.bids, None, false).unwrap_err();
    assert!(format!("{err:#}").contains("func"));
    assert_eq!(exit_code_for(&err), exit_code::FAILURE);
    assert!(!fx.upload.exists());
}

#[test]
fn collect_prints_templates_by_datatype() {
    let fx = fixture();
    let json = run_collect(&fx.bids, None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let templates = value["pet"]["templates"].as_array().unwrap();
    assert!(templates.contains(&serde_json::Value::from(
        "sub-{SUBJECT}/ses-{SESSION}/pet/sub-{SUBJECT}_ses-{SESSION}_pet.json"
    )));
    assert!(
        value["filemapped_dataset_path"]
            .as_str()
            .unwrap()
            .ends_with("ds004869.nda")
    );
}

#[test]
fn lookup_writes_one_row_per_file() {
    let fx = fixture();
    let result = run_lookup(&fx.bids, None).unwrap();

    assert_eq!(result.output, fx.upload.join("lookup.csv"));
    assert_eq!(result.records.len(), 16);
    let text = std::fs::read_to_string(&result.output).unwrap();
    assert_eq!(text.lines().count(), 17);
}

#[cfg(unix)]
#[test]
fn full_pipeline_links_files_per_guid() {
    let fx = fixture();
    run_templates(&fx.bids, None, true).unwrap();
    let lookup = run_lookup(&fx.bids, None).unwrap();
    fill_subject_keys(&lookup.output);

    let result = run_prepare(&options(&fx.bids, &fx.upload)).unwrap();
    assert_eq!(result.exit_code(), exit_code::SUCCESS);

    let report = result.report.as_ref().unwrap();
    assert_eq!(report.documents.len(), 2);
    // Four subject/session labels per document.
    assert_eq!(report.total_placed(), 8);

    let link = fx.upload.join(
        "image03_sourcedata.anat.anat/sub-NDARINV0001_ses-baseline.sourcedata.anat.anat/\
         sub-NDARINV0001/ses-baseline/anat/sub-NDARINV0001_ses-baseline_T1w.nii.gz",
    );
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    let top_level = fx.upload.join(
        "image03_sourcedata.pet.pet/sub-NDARINV0002_ses-rescan.sourcedata.pet.pet/participants.tsv",
    );
    assert!(top_level.exists());
}

#[test]
fn skip_filemapper_still_validates_inputs() {
    let fx = fixture();
    std::fs::create_dir_all(&fx.upload).unwrap();
    let mut opts = options(&fx.bids, &fx.upload);
    opts.skip_filemapper = true;

    let result = run_prepare(&opts).unwrap();
    assert!(result.report.is_none());
    assert_eq!(result.exit_code(), exit_code::SUCCESS);

    opts.source = fx.bids.join("missing");
    let err = run_prepare(&opts).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_code::BAD_SOURCE);
}

#[test]
fn input_checks_map_to_exit_codes() {
    let fx = fixture();

    let err = run_prepare(&options(&fx.bids, &fx.upload)).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_code::FAILURE);

    std::fs::create_dir_all(&fx.upload).unwrap();
    let manifest = fx.upload.join("manifest-data");
    let mut opts = options(&fx.bids.join("missing"), &fx.upload);
    opts.manifest_dir = Some(manifest.clone());
    let err = run_prepare(&opts).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_code::MISSING_MANIFEST_DIR);

    std::fs::create_dir_all(&manifest).unwrap();
    let err = run_prepare(&opts).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_code::MISSING_MANIFEST_SCRIPT);

    std::fs::write(manifest.join(MANIFEST_SCRIPT), "").unwrap();
    let err = run_prepare(&opts).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_code::BAD_SOURCE);
}

#[test]
fn malformed_lookup_label_sets_exit_code() {
    let fx = fixture();
    run_templates(&fx.bids, None, true).unwrap();
    std::fs::write(
        fx.upload.join("lookup.csv"),
        "bids_subject_session,subjectkey\nsub-01_ses-baseline_run-1,NDARINV0001\n",
    )
    .unwrap();

    let mut opts = options(&fx.bids, &fx.upload);
    opts.mode = PlacementMode::Copy;
    let result = run_prepare(&opts).unwrap();
    assert_eq!(result.exit_code(), exit_code::MALFORMED_LABEL);
}
