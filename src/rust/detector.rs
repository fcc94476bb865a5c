use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::{debug, info};
use serde::Serialize;

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::classifier::{ClassifierError, MultinomialNb};
use crate::dataset::Label;
use crate::evaluation::EvaluationReport;
use crate::vectorizer::{FeatureExtractor, FittedVectorizer};

lazy_static! {
    static ref LOADED: Mutex<HashMap<PathBuf, Arc<SpamDetector>>> = Mutex::new(HashMap::new());
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    /// Posterior probability of spam, in [0, 1].
    pub spam_probability: f64,
}

/// A loaded vectorizer/classifier pair ready to classify live text.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spamsieve::{Label, SpamDetector};
///
/// let detector = SpamDetector::shared("model")?;
/// let prediction = detector.classify("WINNER! Claim your free prize now")?;
/// if prediction.label == Label::Spam {
///     println!("spam ({:.1}%)", prediction.spam_probability * 100.0);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpamDetector {
    classifier: MultinomialNb,
    vectorizer: FittedVectorizer,
    report: Option<EvaluationReport>,
}

impl SpamDetector {
    pub fn new(classifier: MultinomialNb, vectorizer: FittedVectorizer) -> Self {
        Self {
            classifier,
            vectorizer,
            report: None,
        }
    }

    pub fn with_report(mut self, report: EvaluationReport) -> Self {
        self.report = Some(report);
        self
    }

    /// Loads the pair from `dir`, plus the evaluation report when the
    /// manifest records it for this pair. A report left over from another
    /// run is not attached.
    ///
    /// # Errors
    /// `ArtifactError::NotFound` if either blob is missing, or any other
    /// error from [`ArtifactStore::load`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let store = ArtifactStore::new(dir);
        let (classifier, vectorizer) = store.load()?;
        let report = store.load_current_report()?;
        if report.is_none() {
            debug!("Loaded {:?} without an evaluation report", store.dir());
        }
        Ok(Self {
            classifier,
            vectorizer,
            report,
        })
    }

    /// Process-wide memoized [`load`](Self::load).
    ///
    /// The first successful load of a directory is kept for the life of the
    /// process; later calls return the same instance. Failed loads are not
    /// cached, so a later call retries.
    pub fn shared(dir: impl AsRef<Path>) -> Result<Arc<Self>, ArtifactError> {
        let dir = dir.as_ref();
        let key = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

        let mut loaded = LOADED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(detector) = loaded.get(&key) {
            return Ok(Arc::clone(detector));
        }

        info!("Loading detector from {:?}", key);
        let detector = Arc::new(Self::load(&key)?);
        loaded.insert(key, Arc::clone(&detector));
        Ok(detector)
    }

    pub fn classifier(&self) -> &MultinomialNb {
        &self.classifier
    }

    pub fn vectorizer(&self) -> &FittedVectorizer {
        &self.vectorizer
    }

    /// Metrics of the run that produced these artifacts, if saved.
    pub fn report(&self) -> Option<&EvaluationReport> {
        self.report.as_ref()
    }

    /// Classifies one message.
    ///
    /// # Errors
    /// `ValidationError` for empty or whitespace-only text.
    pub fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let vector = self.vectorizer.transform(text);
        let label = self.classifier.predict(&vector)?;
        let proba = self.classifier.predict_proba(&vector)?;
        Ok(Prediction {
            label,
            spam_probability: proba[Label::Spam.index()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ConfusionMatrix;
    use crate::vectorizer::TfidfVectorizer;
    use tempfile::tempdir;

    fn detector() -> SpamDetector {
        let texts = ["free prize winner", "claim free cash", "lunch tomorrow", "meeting at noon"];
        let labels = [Label::Spam, Label::Spam, Label::Ham, Label::Ham];
        let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&texts).unwrap();
        let classifier = MultinomialNb::builder()
            .with_n_features(vectorizer.n_features())
            .unwrap()
            .fit(&matrix, &labels)
            .unwrap();
        SpamDetector::new(classifier, vectorizer)
    }

    #[test]
    fn test_classify() {
        let detector = detector();
        let spam = detector.classify("You are a winner of a free prize").unwrap();
        assert_eq!(spam.label, Label::Spam);
        assert!(spam.spam_probability > 0.5);

        let ham = detector.classify("lunch meeting tomorrow?").unwrap();
        assert_eq!(ham.label, Label::Ham);
        assert!(ham.spam_probability < 0.5);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let detector = detector();
        assert!(matches!(
            detector.classify("   "),
            Err(ClassifierError::ValidationError(_))
        ));
    }

    #[test]
    fn test_shared_caches_successful_loads() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            SpamDetector::shared(tmp.path()),
            Err(ArtifactError::NotFound(_))
        ));

        let d = detector();
        ArtifactStore::new(tmp.path())
            .save(d.classifier(), d.vectorizer())
            .unwrap();

        let first = SpamDetector::shared(tmp.path()).unwrap();
        let second = SpamDetector::shared(tmp.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.report().is_none());
    }

    #[test]
    fn test_report_from_previous_run_is_not_attached() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let d = detector();
        let old_report = EvaluationReport::from_confusion(
            ConfusionMatrix::from([[2, 0], [0, 2]]),
            4,
            d.vectorizer().vocabulary_size(),
        );
        store.save(d.classifier(), d.vectorizer()).unwrap();
        store.save_report(&old_report).unwrap();
        assert_eq!(SpamDetector::load(tmp.path()).unwrap().report(), Some(&old_report));

        // Retrain on a larger vocabulary; the run stops before its report.
        let texts = [
            "free prize winner today",
            "claim free cash bonus",
            "lunch tomorrow downtown",
            "meeting at noon sharp",
        ];
        let labels = [Label::Spam, Label::Spam, Label::Ham, Label::Ham];
        let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&texts).unwrap();
        let classifier = MultinomialNb::builder()
            .with_n_features(vectorizer.n_features())
            .unwrap()
            .fit(&matrix, &labels)
            .unwrap();
        store.save(&classifier, &vectorizer).unwrap();

        let loaded = SpamDetector::load(tmp.path()).unwrap();
        assert!(store.verify().unwrap());
        assert_ne!(
            loaded.vectorizer().vocabulary_size(),
            old_report.vocabulary_size
        );
        assert!(loaded.report().is_none());
    }
}
