use log::{debug, info};
use ndarray::{Array1, Array2};

use super::error::ClassifierError;
use super::model::MultinomialNb;
use crate::config::DEFAULT_ALPHA;
use crate::dataset::Label;
use crate::vectorizer::SparseVector;

/// A builder for fitting a [`MultinomialNb`] with a fluent interface.
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
    alpha: f64,
    n_features: Option<usize>,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a builder with Laplace smoothing (`alpha = 1.0`).
    ///
    /// # Example
    /// ```
    /// use spamsieve::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            n_features: None,
        }
    }

    /// Sets the additive smoothing parameter.
    ///
    /// # Returns
    /// * `Err(ClassifierError::ValidationError)` if `alpha` is not finite and positive
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self, ClassifierError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "alpha must be finite and positive, got {}",
                alpha
            )));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Sets the dimension of the feature space, usually the vocabulary size
    /// of the fitted vectorizer.
    pub fn with_n_features(mut self, n_features: usize) -> Result<Self, ClassifierError> {
        if n_features == 0 {
            return Err(ClassifierError::ValidationError(
                "Feature space cannot be empty".into(),
            ));
        }
        self.n_features = Some(n_features);
        Ok(self)
    }

    /// Validates training data according to the following rules:
    /// - There is at least one sample
    /// - Vectors and labels have the same length
    /// - Both classes are represented
    /// - Every index lies inside the feature space
    /// - No feature value is negative or non-finite
    fn validate_training_data(
        vectors: &[SparseVector],
        labels: &[Label],
        n_features: usize,
    ) -> Result<(), ClassifierError> {
        if vectors.is_empty() {
            return Err(ClassifierError::ValidationError("No training samples".into()));
        }
        if vectors.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} vectors but {} labels",
                vectors.len(),
                labels.len()
            )));
        }
        for label in Label::ALL {
            if !labels.contains(&label) {
                return Err(ClassifierError::ValidationError(format!(
                    "Training labels contain no '{}' samples",
                    label
                )));
            }
        }
        for (row, vector) in vectors.iter().enumerate() {
            if let Some(max) = vector.max_index() {
                if max >= n_features {
                    return Err(ClassifierError::ValidationError(format!(
                        "Sample {} has feature index {} outside a {}-feature space",
                        row, max, n_features
                    )));
                }
            }
            if let Some(v) = vector.values().iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(ClassifierError::ValidationError(format!(
                    "Sample {} has invalid feature value {}; values must be finite and non-negative",
                    row, v
                )));
            }
        }
        Ok(())
    }

    /// Estimates class priors and smoothed per-class feature likelihoods in
    /// one full-batch pass.
    ///
    /// # Returns
    /// * `Err(ClassifierError::BuildError)` if the feature space was never set
    /// * `Err(ClassifierError::ValidationError)` if the training data is invalid
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use spamsieve::{ClassifierBuilder, FeatureExtractor, Label, TfidfVectorizer};
    ///
    /// let texts = ["free prize now", "lunch tomorrow"];
    /// let labels = [Label::Spam, Label::Ham];
    /// let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&texts)?;
    /// let model = ClassifierBuilder::new()
    ///     .with_n_features(vectorizer.n_features())?
    ///     .fit(&matrix, &labels)?;
    /// assert_eq!(model.predict(&vectorizer.transform("win a prize"))?, Label::Spam);
    /// # Ok(())
    /// # }
    /// ```
    pub fn fit(self, vectors: &[SparseVector], labels: &[Label]) -> Result<MultinomialNb, ClassifierError> {
        let n_features = self
            .n_features
            .ok_or_else(|| ClassifierError::BuildError("Feature space size must be set".into()))?;
        Self::validate_training_data(vectors, labels, n_features)?;

        let n_classes = Label::ALL.len();
        let mut feature_count = Array2::<f64>::zeros((n_classes, n_features));
        let mut class_count = Array1::<f64>::zeros(n_classes);

        for (vector, label) in vectors.iter().zip(labels) {
            let c = label.index();
            class_count[c] += 1.0;
            for (j, value) in vector.iter() {
                feature_count[[c, j]] += value;
            }
        }

        let n_samples = vectors.len() as f64;
        let class_log_prior = class_count.mapv(|count| (count / n_samples).ln());

        let mut feature_log_prob = Array2::<f64>::zeros((n_classes, n_features));
        for c in 0..n_classes {
            let row = feature_count.row(c);
            let denominator = (row.sum() + self.alpha * n_features as f64).ln();
            for j in 0..n_features {
                feature_log_prob[[c, j]] = (row[j] + self.alpha).ln() - denominator;
            }
            debug!(
                "Class '{}': {} samples, feature mass {:.4}",
                Label::ALL[c],
                class_count[c],
                row.sum()
            );
        }

        info!(
            "Fitted multinomial naive Bayes on {} samples x {} features (alpha = {})",
            vectors.len(),
            n_features,
            self.alpha
        );

        Ok(MultinomialNb {
            feature_log_prob,
            class_log_prior,
            class_count,
            alpha: self.alpha,
        })
    }
}
