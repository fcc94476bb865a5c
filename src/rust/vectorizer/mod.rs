mod sparse;
pub mod stop_words;
mod tfidf;
pub mod tokenizer;
mod utils;

pub use sparse::SparseVector;
pub use tfidf::{FittedVectorizer, TfidfVectorizer};

#[derive(Debug, thiserror::Error)]
pub enum VectorizerError {
    #[error("Cannot fit a vectorizer on an empty corpus")]
    EmptyCorpus,
    #[error("Training texts produced an empty vocabulary (only stop words or punctuation)")]
    EmptyVocabulary,
    #[error("Invalid vectorizer configuration: {0}")]
    InvalidConfig(String),
}

/// Projects raw text into a fixed feature space.
///
/// Implementors must be pure: the same text always maps to the same vector,
/// and no call changes the feature space.
pub trait FeatureExtractor {
    /// Dimension of the feature space.
    fn n_features(&self) -> usize;

    /// Vectorizes a single text.
    fn transform(&self, text: &str) -> SparseVector;

    /// Vectorizes every text, preserving order.
    fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector>
    where
        Self: Sized,
    {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }
}
