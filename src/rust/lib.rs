//! Spam/ham text classification: a TF-IDF vectorizer feeding a multinomial
//! naive Bayes model, trained offline on a labelled SMS corpus.
//!
//! # Training
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spamsieve::{run_pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default()
//!     .with_data_path("data/sms_spam_no_header.csv")
//!     .with_artifacts_dir("model");
//! let report = run_pipeline(&config)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! # Classifying
//!
//! A separate process loads the saved artifacts. [`SpamDetector::shared`]
//! keeps one loaded instance per directory for the life of the process:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spamsieve::SpamDetector;
//!
//! let detector = SpamDetector::shared("model")?;
//! let prediction = detector.classify("Hey, are we still meeting for lunch tomorrow?")?;
//! println!("{} (p_spam = {:.3})", prediction.label, prediction.spam_probability);
//! if let Some(report) = detector.report() {
//!     println!("{}", report);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod evaluation;
pub mod pipeline;
pub mod vectorizer;

pub use artifacts::{ArtifactError, ArtifactStore, Manifest};
pub use classifier::{ClassifierBuilder, ClassifierError, ClassifierInfo, MultinomialNb};
pub use config::{ConfigError, PipelineConfig, TextEncoding};
pub use dataset::{load_csv, parse_csv, train_test_split, Dataset, DatasetError, Label, Record, Split};
pub use detector::{Prediction, SpamDetector};
pub use evaluation::{evaluate, ConfusionMatrix, EvaluationError, EvaluationReport};
pub use pipeline::{run_pipeline, train_and_evaluate, PipelineError, TrainingRun};
pub use vectorizer::{FeatureExtractor, FittedVectorizer, SparseVector, TfidfVectorizer, VectorizerError};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
