use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::MultinomialNb;
use crate::config::{ARTIFACTS_ENV, DEFAULT_ARTIFACTS_DIR};
use crate::evaluation::EvaluationReport;
use crate::vectorizer::FittedVectorizer;

pub const CLASSIFIER_FILE: &str = "spam_classifier_mnb.bin";
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.bin";
pub const REPORT_FILE: &str = "evaluation_report.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0:?} (run the training pipeline first)")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to encode {file_type}: {reason}")]
    EncodeError { file_type: String, reason: String },
    #[error("Failed to decode {file_type}: {reason}")]
    DecodeError { file_type: String, reason: String },
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Classifier expects {classifier_features} features but vectorizer produces {vectorizer_features}")]
    FeatureMismatch {
        classifier_features: usize,
        vectorizer_features: usize,
    },
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// SHA-256 digests of the blobs written by one [`ArtifactStore::save`],
/// plus the report [`ArtifactStore::save_report`] wrote for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub crate_version: String,
    pub classifier_sha256: String,
    pub vectorizer_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_sha256: Option<String>,
}

/// Reads and writes the trained artifacts under one directory.
///
/// Layout:
/// - `spam_classifier_mnb.bin` / `tfidf_vectorizer.bin`: bincode blobs
/// - `evaluation_report.json`: metrics of the run that produced the blobs
/// - `manifest.json`: digests used to detect a torn or mixed set of files
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store at the default directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_dir())
    }

    /// `$SPAMSIEVE_ARTIFACTS` if set, otherwise `model` relative to the
    /// working directory.
    pub fn get_default_dir() -> PathBuf {
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_ARTIFACTS_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get_classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_FILE)
    }

    pub fn get_vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    pub fn get_report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// True when both blobs are present.
    pub fn is_saved(&self) -> bool {
        let classifier_path = self.get_classifier_path();
        let vectorizer_path = self.get_vectorizer_path();
        log::debug!("Checking for artifacts:");
        log::debug!("  Classifier: {:?} (exists: {})", classifier_path, classifier_path.exists());
        log::debug!("  Vectorizer: {:?} (exists: {})", vectorizer_path, vectorizer_path.exists());
        classifier_path.exists() && vectorizer_path.exists()
    }

    /// Writes both blobs and a fresh manifest, replacing earlier ones. The
    /// previous run's report is deleted; call [`save_report`](Self::save_report)
    /// afterwards to record the new one.
    pub fn save(
        &self,
        classifier: &MultinomialNb,
        vectorizer: &FittedVectorizer,
    ) -> Result<Manifest, ArtifactError> {
        log::info!("Saving artifacts to {:?}", self.dir);
        fs::create_dir_all(&self.dir)?;

        let classifier_bytes = encode(classifier, "classifier")?;
        let vectorizer_bytes = encode(vectorizer, "vectorizer")?;

        // A stale manifest must not vouch for the new blobs while they are
        // being replaced, and the old report describes a different model.
        let manifest_path = self.get_manifest_path();
        for stale in [&manifest_path, &self.get_report_path()] {
            if stale.exists() {
                log::debug!("Removing stale {:?}", stale);
                fs::remove_file(stale)?;
            }
        }

        write_file(&self.get_classifier_path(), &classifier_bytes)?;
        write_file(&self.get_vectorizer_path(), &vectorizer_bytes)?;

        let manifest = Manifest {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            classifier_sha256: sha256_hex(&classifier_bytes),
            vectorizer_sha256: sha256_hex(&vectorizer_bytes),
            report_sha256: None,
        };
        write_file(&manifest_path, &serde_json::to_vec_pretty(&manifest)?)?;

        log::info!(
            "Saved classifier ({} bytes) and vectorizer ({} bytes)",
            classifier_bytes.len(),
            vectorizer_bytes.len()
        );
        Ok(manifest)
    }

    /// Writes the report, then records its digest in the manifest of the
    /// saved blobs. Without a manifest the report is written but vouched
    /// for by nothing.
    pub fn save_report(&self, report: &EvaluationReport) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.get_report_path();
        log::info!("Saving evaluation report to {:?}", path);
        let bytes = serde_json::to_vec_pretty(report)?;
        write_file(&path, &bytes)?;

        match self.load_manifest()? {
            Some(mut manifest) => {
                manifest.report_sha256 = Some(sha256_hex(&bytes));
                write_file(
                    &self.get_manifest_path(),
                    &serde_json::to_vec_pretty(&manifest)?,
                )?;
            }
            None => log::warn!("No manifest in {:?}; report is not tied to a model", self.dir),
        }
        Ok(())
    }

    /// Loads the classifier and vectorizer together.
    ///
    /// # Errors
    /// - `NotFound` if either blob is missing; nothing is returned in that case
    /// - `HashMismatch` if a manifest exists and disagrees with a blob
    /// - `DecodeError` if a blob cannot be decoded or decodes to an
    ///   inconsistent model
    /// - `FeatureMismatch` if the two blobs come from different runs
    pub fn load(&self) -> Result<(MultinomialNb, FittedVectorizer), ArtifactError> {
        let classifier_path = self.get_classifier_path();
        let vectorizer_path = self.get_vectorizer_path();

        let classifier_bytes = read_file(&classifier_path)?;
        let vectorizer_bytes = read_file(&vectorizer_path)?;

        match self.load_manifest()? {
            Some(manifest) => {
                check_hash(&classifier_bytes, &manifest.classifier_sha256, "classifier")?;
                check_hash(&vectorizer_bytes, &manifest.vectorizer_sha256, "vectorizer")?;
                log::debug!("Artifacts verified against manifest");
            }
            None => log::warn!("No manifest in {:?}; loading artifacts unverified", self.dir),
        }

        let classifier: MultinomialNb = decode(&classifier_bytes, "classifier")?;
        let vectorizer: FittedVectorizer = decode(&vectorizer_bytes, "vectorizer")?;
        classifier
            .validate()
            .map_err(|reason| invalid("classifier", reason))?;
        vectorizer
            .validate()
            .map_err(|reason| invalid("vectorizer", reason))?;
        if classifier.n_features() != vectorizer.vocabulary_size() {
            return Err(ArtifactError::FeatureMismatch {
                classifier_features: classifier.n_features(),
                vectorizer_features: vectorizer.vocabulary_size(),
            });
        }
        log::info!(
            "Loaded artifacts from {:?} ({} features)",
            self.dir,
            vectorizer.vocabulary_size()
        );
        Ok((classifier, vectorizer))
    }

    /// Reads the report file as is, whichever run wrote it.
    pub fn load_report(&self) -> Result<EvaluationReport, ArtifactError> {
        let bytes = read_file(&self.get_report_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The report of the run that produced the saved blobs.
    ///
    /// `None` when there is no report, or when the manifest does not record
    /// this report's digest.
    pub fn load_current_report(&self) -> Result<Option<EvaluationReport>, ArtifactError> {
        let path = self.get_report_path();
        let bytes = match read_file(&path) {
            Ok(bytes) => bytes,
            Err(ArtifactError::NotFound(_)) => {
                log::debug!("No evaluation report at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let expected = self.load_manifest()?.and_then(|m| m.report_sha256);
        match expected {
            Some(expected) if sha256_hex(&bytes) == expected => {
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Some(_) => {
                log::warn!("Report {:?} does not match the manifest; ignoring it", path);
                Ok(None)
            }
            None => {
                log::warn!("Report {:?} is not recorded in the manifest; ignoring it", path);
                Ok(None)
            }
        }
    }

    pub fn load_manifest(&self) -> Result<Option<Manifest>, ArtifactError> {
        let path = self.get_manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Checks both blobs, and the report when the manifest records one,
    /// against the manifest. Missing files or a missing manifest yield
    /// `Ok(false)`.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        if !self.is_saved() {
            log::info!("One or both artifacts do not exist");
            return Ok(false);
        }
        let Some(manifest) = self.load_manifest()? else {
            log::info!("No manifest to verify against");
            return Ok(false);
        };

        let classifier_ok =
            sha256_hex(&fs::read(self.get_classifier_path())?) == manifest.classifier_sha256;
        let vectorizer_ok =
            sha256_hex(&fs::read(self.get_vectorizer_path())?) == manifest.vectorizer_sha256;

        let report_ok = match &manifest.report_sha256 {
            Some(expected) => match fs::read(self.get_report_path()) {
                Ok(bytes) => sha256_hex(&bytes) == *expected,
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            },
            None => true,
        };

        log::info!("Verification results:");
        log::info!("  Classifier hash verification: {}", classifier_ok);
        log::info!("  Vectorizer hash verification: {}", vectorizer_ok);
        log::info!("  Report hash verification: {}", report_ok);
        Ok(classifier_ok && vectorizer_ok && report_ok)
    }

    /// Deletes every artifact file this store writes.
    pub fn remove(&self) -> Result<(), ArtifactError> {
        for path in [
            self.get_classifier_path(),
            self.get_vectorizer_path(),
            self.get_report_path(),
            self.get_manifest_path(),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T, file_type: &str) -> Result<Vec<u8>, ArtifactError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(|e| {
        ArtifactError::EncodeError {
            file_type: file_type.to_string(),
            reason: e.to_string(),
        }
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], file_type: &str) -> Result<T, ArtifactError> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| ArtifactError::DecodeError {
            file_type: file_type.to_string(),
            reason: e.to_string(),
        })
}

fn invalid(file_type: &str, reason: String) -> ArtifactError {
    log::error!("Decoded {} is inconsistent: {}", file_type, reason);
    ArtifactError::DecodeError {
        file_type: file_type.to_string(),
        reason,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::IoError(e),
    })
}

/// Writes through a sibling temp file so readers never see a half-written blob.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let tmp = path.with_extension("tmp");
    log::debug!("Writing {} bytes to {:?}", bytes.len(), path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn check_hash(bytes: &[u8], expected: &str, file_type: &str) -> Result<(), ArtifactError> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
        return Err(ArtifactError::HashMismatch {
            file_type: file_type.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
