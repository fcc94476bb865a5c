use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::ClassifierInfo;
use crate::dataset::Label;
use crate::vectorizer::SparseVector;

/// A fitted multinomial naive Bayes model over TF-IDF features.
///
/// The model is immutable once fitted and `Send + Sync`, so a single instance
/// can be shared across threads behind an `Arc`.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spamsieve::{ClassifierBuilder, FeatureExtractor, Label, TfidfVectorizer};
///
/// let texts = ["claim your free prize", "see you at lunch"];
/// let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&texts)?;
/// let model = ClassifierBuilder::new()
///     .with_n_features(vectorizer.n_features())?
///     .fit(&matrix, &[Label::Spam, Label::Ham])?;
///
/// let label = model.predict(&vectorizer.transform("free prize inside"))?;
/// assert_eq!(label, Label::Spam);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// `[class, feature]` smoothed log likelihoods.
    pub(crate) feature_log_prob: Array2<f64>,
    pub(crate) class_log_prior: Array1<f64>,
    pub(crate) class_count: Array1<f64>,
    pub(crate) alpha: f64,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<MultinomialNb>();
    }
};

impl MultinomialNb {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    pub fn feature_log_prob(&self) -> &Array2<f64> {
        &self.feature_log_prob
    }

    pub fn class_log_prior(&self) -> &Array1<f64> {
        &self.class_log_prior
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns information about the fitted model
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            n_features: self.n_features(),
            alpha: self.alpha,
            ham_samples: self.class_count[Label::Ham.index()] as usize,
            spam_samples: self.class_count[Label::Spam.index()] as usize,
        }
    }

    /// Unnormalized log posterior `log P(c) + sum_j x_j log P(j | c)` for
    /// each class, indexed by label code.
    ///
    /// # Errors
    /// `PredictionError` if `vector` references a feature outside the
    /// fitted feature space.
    pub fn joint_log_likelihood(&self, vector: &SparseVector) -> Result<[f64; 2], ClassifierError> {
        if let Some(max) = vector.max_index() {
            if max >= self.n_features() {
                return Err(ClassifierError::PredictionError(format!(
                    "Feature index {} is outside the fitted {}-feature space",
                    max,
                    self.n_features()
                )));
            }
        }

        let mut jll = [0.0; 2];
        for label in Label::ALL {
            let c = label.index();
            jll[c] = self.class_log_prior[c] + vector.dot(self.feature_log_prob.row(c));
        }
        Ok(jll)
    }

    /// Posterior probabilities indexed by label code; they sum to 1.
    pub fn predict_proba(&self, vector: &SparseVector) -> Result<[f64; 2], ClassifierError> {
        let jll = self.joint_log_likelihood(vector)?;
        let max = jll[0].max(jll[1]);
        let ham = (jll[0] - max).exp();
        let spam = (jll[1] - max).exp();
        let total = ham + spam;
        Ok([ham / total, spam / total])
    }

    /// The class with the larger posterior. An exact tie resolves to
    /// [`Label::Ham`].
    pub fn predict(&self, vector: &SparseVector) -> Result<Label, ClassifierError> {
        let jll = self.joint_log_likelihood(vector)?;
        if jll[Label::Spam.index()] > jll[Label::Ham.index()] {
            Ok(Label::Spam)
        } else {
            Ok(Label::Ham)
        }
    }

    /// Predicts every vector, preserving order.
    pub fn predict_batch(&self, vectors: &[SparseVector]) -> Result<Vec<Label>, ClassifierError> {
        vectors.iter().map(|v| self.predict(v)).collect()
    }

    /// Checks the shapes `joint_log_likelihood` indexes by: one row of
    /// finite log-probs, one prior and one count per class.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let n_classes = Label::ALL.len();
        if self.feature_log_prob.nrows() != n_classes
            || self.class_log_prior.len() != n_classes
            || self.class_count.len() != n_classes
        {
            return Err(format!(
                "expected {} classes, found {} log-prob rows, {} priors, {} counts",
                n_classes,
                self.feature_log_prob.nrows(),
                self.class_log_prior.len(),
                self.class_count.len()
            ));
        }
        if self.n_features() == 0 {
            return Err("no features".to_string());
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(format!("invalid alpha {}", self.alpha));
        }
        let all_finite = self
            .feature_log_prob
            .iter()
            .chain(self.class_log_prior.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("non-finite log probability".to_string());
        }
        Ok(())
    }
}
