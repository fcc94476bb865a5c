//! The one-shot training run: load, split, vectorize, fit, evaluate, persist.

use log::info;

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::classifier::{ClassifierBuilder, ClassifierError, MultinomialNb};
use crate::config::{ConfigError, PipelineConfig};
use crate::dataset::{load_csv, train_test_split, Dataset, DatasetError, Label};
use crate::evaluation::{evaluate, EvaluationError, EvaluationReport};
use crate::vectorizer::{FeatureExtractor, FittedVectorizer, TfidfVectorizer, VectorizerError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Vectorizer(#[from] VectorizerError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// In-memory result of training on one split.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub classifier: MultinomialNb,
    pub vectorizer: FittedVectorizer,
    pub report: EvaluationReport,
}

/// Splits `dataset`, fits the vectorizer and classifier on the training
/// partition only, and scores the held-out partition. No I/O.
pub fn train_and_evaluate(dataset: &Dataset, config: &PipelineConfig) -> Result<TrainingRun, PipelineError> {
    config.validate()?;

    let split = train_test_split(dataset, config.test_size, config.seed)?;
    info!(
        "Training on {} records ({} spam), holding out {} ({} spam)",
        split.train.len(),
        split.train.count(Label::Spam),
        split.test.len(),
        split.test.count(Label::Spam)
    );

    let train_texts = split.train.texts();
    let (vectorizer, train_matrix) = TfidfVectorizer::new()
        .with_max_features(config.max_features)
        .fit_transform(&train_texts)?;

    let classifier = ClassifierBuilder::new()
        .with_alpha(config.alpha)?
        .with_n_features(vectorizer.n_features())?
        .fit(&train_matrix, &split.train.labels())?;

    let test_matrix = vectorizer.transform_batch(&split.test.texts());
    let predicted = classifier.predict_batch(&test_matrix)?;
    let report = evaluate(
        &split.test.labels(),
        &predicted,
        split.train.len(),
        vectorizer.vocabulary_size(),
    )?;

    Ok(TrainingRun {
        classifier,
        vectorizer,
        report,
    })
}

/// Runs the full pipeline described by `config` and persists the
/// classifier, vectorizer and evaluation report under
/// `config.artifacts_dir`.
///
/// Nothing is written unless every earlier stage succeeded. The report is
/// saved after the blobs so the manifest, rewritten last, covers all three.
pub fn run_pipeline(config: &PipelineConfig) -> Result<EvaluationReport, PipelineError> {
    config.validate()?;
    info!("=== Starting training pipeline ===");

    let dataset = load_csv(&config.data_path, config.encoding)?;
    let run = train_and_evaluate(&dataset, config)?;

    let store = ArtifactStore::new(&config.artifacts_dir);
    store.save(&run.classifier, &run.vectorizer)?;
    store.save_report(&run.report)?;

    info!(
        "=== Pipeline complete: accuracy {:.4}, f1 {:.4} ===",
        run.report.accuracy, run.report.f1
    );
    Ok(run.report)
}
