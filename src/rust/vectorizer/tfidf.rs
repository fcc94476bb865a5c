use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::sparse::SparseVector;
use super::tokenizer::analyze;
use super::utils::{normalize_vector, smooth_idf};
use super::{FeatureExtractor, VectorizerError};
use crate::config::DEFAULT_MAX_FEATURES;

/// Unfitted TF-IDF settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the vocabulary at the `max_features` most frequent training terms.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Learns the vocabulary and idf weights from `documents` only.
    ///
    /// When more than `max_features` terms survive stop-word removal, the
    /// ones with the highest total count are kept, ties going to the
    /// alphabetically smaller term. Retained terms are indexed alphabetically.
    ///
    /// # Errors
    /// - `InvalidConfig` if `max_features` is 0
    /// - `EmptyCorpus` if `documents` is empty
    /// - `EmptyVocabulary` if no document yields a single term
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> Result<FittedVectorizer, VectorizerError> {
        if self.max_features == 0 {
            return Err(VectorizerError::InvalidConfig(
                "max_features must be at least 1".into(),
            ));
        }
        if documents.is_empty() {
            return Err(VectorizerError::EmptyCorpus);
        }

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let tokens = analyze(doc.as_ref());
            let mut seen = HashSet::new();
            for token in tokens {
                if seen.insert(token.clone()) {
                    *doc_freqs.entry(token.clone()).or_default() += 1;
                }
                *term_counts.entry(token).or_default() += 1;
            }
        }

        if term_counts.is_empty() {
            return Err(VectorizerError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        let distinct = ranked.len();
        if distinct > self.max_features {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(self.max_features);
            debug!("Truncated vocabulary from {} to {} terms", distinct, self.max_features);
        }

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_docs = documents.len();
        let idf = terms
            .iter()
            .map(|term| smooth_idf(n_docs, doc_freqs.get(term).copied().unwrap_or(0)))
            .collect::<Array1<f64>>();

        info!(
            "Fitted TF-IDF vocabulary: {} terms from {} documents",
            terms.len(),
            n_docs
        );

        Ok(FittedVectorizer {
            terms,
            idf,
            n_documents: n_docs,
        })
    }

    /// [`fit`](Self::fit) followed by a transform of the same documents.
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<(FittedVectorizer, Vec<SparseVector>), VectorizerError> {
        let fitted = self.fit(documents)?;
        let matrix = fitted.transform_batch(documents);
        Ok((fitted, matrix))
    }
}

/// A frozen vocabulary with its idf weights.
///
/// Transforming text never changes the vocabulary; unknown terms are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    /// Alphabetically sorted; the position of a term is its feature index.
    terms: Vec<String>,
    idf: Array1<f64>,
    n_documents: usize,
}

impl FittedVectorizer {
    pub fn vocabulary(&self) -> &[String] {
        &self.terms
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index_of(term).is_some()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.idf[i])
    }

    /// Number of documents the vectorizer was fitted on.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Checks the invariants `transform` indexes by: one finite idf weight
    /// per term, and strictly ascending terms for the binary search.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.terms.is_empty() {
            return Err("vocabulary is empty".to_string());
        }
        if self.idf.len() != self.terms.len() {
            return Err(format!(
                "{} idf weights for {} terms",
                self.idf.len(),
                self.terms.len()
            ));
        }
        if let Some(pair) = self.terms.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "vocabulary is not sorted and unique at {:?}, {:?}",
                pair[0], pair[1]
            ));
        }
        if let Some(weight) = self.idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(format!("invalid idf weight {}", weight));
        }
        Ok(())
    }
}

impl FeatureExtractor for FittedVectorizer {
    fn n_features(&self) -> usize {
        self.terms.len()
    }

    fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in analyze(text) {
            if let Some(index) = self.index_of(&token) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut vector =
            SparseVector::from_sorted(counts.into_iter().map(|(i, tf)| (i, tf * self.idf[i])));
        normalize_vector(&mut vector);
        vector
    }
}
