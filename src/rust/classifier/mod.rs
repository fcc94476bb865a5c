use serde::{Deserialize, Serialize};

mod error;
mod model;
pub mod builder;

pub use error::ClassifierError;
pub use model::MultinomialNb;
pub use builder::ClassifierBuilder;

/// Summary of a fitted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierInfo {
    /// Dimension of the feature space the model was fitted on
    pub n_features: usize,
    /// Additive smoothing used during fitting
    pub alpha: f64,
    /// Number of ham training samples
    pub ham_samples: usize,
    /// Number of spam training samples
    pub spam_samples: usize,
}
