use std::collections::HashSet;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env};
use spamsieve::{
    load_csv, run_pipeline, train_and_evaluate, ArtifactStore, ClassifierBuilder, FeatureExtractor,
    Label, PipelineConfig, SpamDetector, TextEncoding, TfidfVectorizer,
};
use tempfile::tempdir;

const SPAM_TEXT: &str =
    "WINNER! Your free entry to the contest is confirmed! Text STOP to 8888 for cancellation.";
const HAM_TEXT: &str = "Hey, are we still meeting for lunch tomorrow?";

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sms_small.csv")
}

fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_data_path(fixture())
        .with_artifacts_dir(dir.join("model"))
}

#[test]
fn test_loader_counts_rows_and_maps_labels() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    assert_eq!(dataset.len(), 62);
    assert_eq!(dataset.count(Label::Spam), 31);
    assert_eq!(dataset.count(Label::Ham), 31);
    assert!(dataset.records().iter().all(|r| r.label.code() <= 1));
    Ok(())
}

#[test]
fn test_known_messages_on_full_corpus() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&dataset.texts())?;
    for term in ["winner", "free", "contest", "text", "stop", "cancellation"] {
        assert!(vectorizer.contains(term), "vocabulary should contain '{}'", term);
    }

    let classifier = ClassifierBuilder::new()
        .with_n_features(vectorizer.n_features())?
        .fit(&matrix, &dataset.labels())?;

    assert_eq!(classifier.predict(&vectorizer.transform(SPAM_TEXT))?, Label::Spam);
    assert_eq!(classifier.predict(&vectorizer.transform(HAM_TEXT))?, Label::Ham);
    Ok(())
}

#[test]
fn test_run_pipeline_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let tmp = tempdir()?;
    let config = config_in(tmp.path());

    let report = run_pipeline(&config)?;
    assert_eq!(report.test_size, 13);
    assert_eq!(report.train_size, 49);
    assert_eq!(report.confusion_matrix.total(), report.test_size);
    for rate in [report.accuracy, report.precision, report.recall, report.f1] {
        assert!((0.0..=1.0).contains(&rate));
    }
    assert!(report.accuracy >= 0.9, "accuracy too low: {}", report.accuracy);

    let detector = SpamDetector::load(&config.artifacts_dir)?;
    assert_eq!(detector.report(), Some(&report));
    assert_eq!(detector.classify(SPAM_TEXT)?.label, Label::Spam);
    assert_eq!(detector.classify(HAM_TEXT)?.label, Label::Ham);
    Ok(())
}

#[test]
fn test_reruns_are_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    let config = PipelineConfig::default();

    let first = train_and_evaluate(&dataset, &config)?;
    let second = train_and_evaluate(&dataset, &config)?;
    assert_eq!(first.vectorizer, second.vectorizer);
    assert_eq!(first.classifier, second.classifier);
    assert_eq!(first.report, second.report);
    Ok(())
}

#[test]
fn test_transform_never_leaks_unseen_terms() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    let split = spamsieve::train_test_split(&dataset, 0.2, 42)?;
    let vectorizer = TfidfVectorizer::new().fit(&split.train.texts())?;

    let vocabulary: HashSet<&str> = vectorizer.vocabulary().iter().map(String::as_str).collect();
    let before = vectorizer.vocabulary_size();
    for text in split.test.texts() {
        let vector = vectorizer.transform(text);
        for &index in vector.indices() {
            let term = vectorizer.term(index).expect("index inside vocabulary");
            assert!(vocabulary.contains(term));
        }
    }
    let vector = vectorizer.transform("zzzunseen qqqnever xylograph");
    assert!(vector.is_empty());
    assert_eq!(vectorizer.vocabulary_size(), before);
    Ok(())
}

#[test]
fn test_fit_then_transform_is_repeatable() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    let texts = dataset.texts();
    let vectorizer = TfidfVectorizer::new().fit(&texts)?;
    assert_eq!(vectorizer.transform_batch(&texts), vectorizer.transform_batch(&texts));
    Ok(())
}

#[test]
fn test_saved_artifacts_reproduce_predictions() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = load_csv(fixture(), TextEncoding::Latin1)?;
    let run = train_and_evaluate(&dataset, &PipelineConfig::default())?;

    let tmp = tempdir()?;
    let store = ArtifactStore::new(tmp.path());
    store.save(&run.classifier, &run.vectorizer)?;
    let (classifier, vectorizer) = store.load()?;

    for text in [SPAM_TEXT, HAM_TEXT, "call me later", "free"] {
        let before = run.vectorizer.transform(text);
        let after = vectorizer.transform(text);
        assert_eq!(before, after);
        assert_eq!(run.classifier.predict(&before)?, classifier.predict(&after)?);
        assert_eq!(
            run.classifier.joint_log_likelihood(&before)?,
            classifier.joint_log_likelihood(&after)?
        );
    }
    Ok(())
}

#[test]
fn test_retraining_overwrites_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let tmp = tempdir()?;
    let config = config_in(tmp.path());

    run_pipeline(&config)?;
    let first = ArtifactStore::new(&config.artifacts_dir).load_manifest()?;

    let config = config.with_max_features(20);
    let report = run_pipeline(&config)?;
    let store = ArtifactStore::new(&config.artifacts_dir);
    let second = store.load_manifest()?;

    assert_ne!(first, second);
    assert!(store.verify()?);
    assert_eq!(report.vocabulary_size, 20);
    assert_eq!(store.load()?.1.vocabulary_size(), 20);
    assert!(second.and_then(|m| m.report_sha256).is_some());
    assert_eq!(store.load_current_report()?, Some(report));
    Ok(())
}
