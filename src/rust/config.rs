use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the input corpus path.
pub const DATA_ENV: &str = "SPAMSIEVE_DATA";
/// Environment variable overriding the artifacts directory.
pub const ARTIFACTS_ENV: &str = "SPAMSIEVE_ARTIFACTS";
/// Environment variable overriding the split seed.
pub const SEED_ENV: &str = "SPAMSIEVE_SEED";

pub const DEFAULT_DATA_PATH: &str = "data/sms_spam_no_header.csv";
pub const DEFAULT_ARTIFACTS_DIR: &str = "model";
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_FEATURES: usize = 5000;
pub const DEFAULT_ALPHA: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("Unknown text encoding '{0}' (expected latin1 or utf8)")]
    UnknownEncoding(String),
}

/// Declared encoding of the input corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// ISO-8859-1. Every byte decodes to the code point of the same value.
    #[default]
    Latin1,
    /// Strict UTF-8.
    Utf8,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, std::str::Utf8Error> {
        match self {
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Utf8 => std::str::from_utf8(bytes).map(str::to_owned),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            _ => Err(ConfigError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latin1 => write!(f, "latin1"),
            Self::Utf8 => write!(f, "utf8"),
        }
    }
}

/// Everything a training run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub encoding: TextEncoding,
    pub artifacts_dir: PathBuf,
    /// Fraction of the corpus held out for evaluation.
    pub test_size: f64,
    pub seed: u64,
    /// Upper bound on the vocabulary size.
    pub max_features: usize,
    /// Additive smoothing for the naive Bayes likelihoods.
    pub alpha: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            encoding: TextEncoding::Latin1,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            max_features: DEFAULT_MAX_FEATURES,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `SPAMSIEVE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(path) = env::var(DATA_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var(ARTIFACTS_ENV) {
            config.artifacts_dir = PathBuf::from(dir);
        }
        if let Ok(seed) = env::var(SEED_ENV) {
            config.seed = seed.parse().map_err(|e| ConfigError::InvalidValue {
                name: SEED_ENV,
                reason: format!("'{}': {}", seed, e),
            })?;
        }
        Ok(config)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigError::InvalidValue {
                name: "test_size",
                reason: format!("{} is not in the open interval (0, 1)", self.test_size),
            });
        }
        if self.max_features == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_features",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "alpha",
                reason: format!("{} must be finite and positive", self.alpha),
            });
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "data_path",
                reason: "cannot be empty".into(),
            });
        }
        Ok(())
    }
}
