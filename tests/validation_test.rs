use std::fs;

use spamsieve::{
    run_pipeline, ArtifactError, ArtifactStore, DatasetError, PipelineConfig, PipelineError,
    SpamDetector,
};
use tempfile::{tempdir, TempDir};

type Outcome = (Result<spamsieve::EvaluationReport, PipelineError>, ArtifactStore, TempDir);

fn run_on(contents: &[u8]) -> Outcome {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("corpus.csv");
    fs::write(&data, contents).unwrap();
    let artifacts = tmp.path().join("model");
    let config = PipelineConfig::default()
        .with_data_path(&data)
        .with_artifacts_dir(&artifacts);
    let result = run_pipeline(&config);
    (result, ArtifactStore::new(artifacts), tmp)
}

#[test]
fn test_unknown_label_stops_before_training() {
    let (result, store, _tmp) = run_on(b"ham,hello there\nspam,free prize\nphishing,click here\n");
    assert!(matches!(
        result,
        Err(PipelineError::Dataset(DatasetError::UnknownLabel { row: 3, .. }))
    ));
    assert!(!store.is_saved());
}

#[test]
fn test_single_column_row() {
    let (result, store, _tmp) = run_on(b"ham,hello there\nspam\n");
    assert!(matches!(
        result,
        Err(PipelineError::Dataset(DatasetError::MissingColumns { row: 2, found: 1 }))
    ));
    assert!(!store.is_saved());
}

#[test]
fn test_empty_file() {
    let (result, _, _tmp) = run_on(b"");
    assert!(matches!(
        result,
        Err(PipelineError::Dataset(DatasetError::EmptyDataset))
    ));
}

#[test]
fn test_missing_input_file() {
    let tmp = tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_data_path(tmp.path().join("does-not-exist.csv"))
        .with_artifacts_dir(tmp.path().join("model"));
    assert!(matches!(
        run_pipeline(&config),
        Err(PipelineError::Dataset(DatasetError::Io { .. }))
    ));
}

#[test]
fn test_single_class_corpus_is_rejected() {
    let (result, store, _tmp) = run_on(b"ham,lunch today\nham,meeting later\nham,call mum\nham,see you\nham,running late\n");
    assert!(matches!(result, Err(PipelineError::Classifier(_))));
    assert!(!store.is_saved());
}

#[test]
fn test_loading_from_empty_directory_is_not_found() {
    let tmp = tempdir().unwrap();
    assert!(matches!(
        SpamDetector::load(tmp.path()),
        Err(ArtifactError::NotFound(_))
    ));
    assert!(matches!(
        ArtifactStore::new(tmp.path().join("nope")).load(),
        Err(ArtifactError::NotFound(_))
    ));
}
