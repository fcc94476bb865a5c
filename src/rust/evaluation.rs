//! Held-out metrics with spam as the positive class.
//!
//! Any rate whose denominator is zero is reported as 0 rather than NaN; the
//! condition is logged at `warn` level.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::dataset::Label;

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Got {predicted} predictions for {actual} true labels")]
    LengthMismatch { predicted: usize, actual: usize },
}

/// 2x2 tally of (actual, predicted) pairs.
///
/// Serialized as `[[tn, fp], [fn, tp]]`: rows are actual ham/spam, columns
/// predicted ham/spam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[[usize; 2]; 2]", into = "[[usize; 2]; 2]")]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Result<Self, EvaluationError> {
        if actual.len() != predicted.len() {
            return Err(EvaluationError::LengthMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }

        let mut matrix = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            matrix.record(a, p);
        }
        Ok(matrix)
    }

    pub fn record(&mut self, actual: Label, predicted: Label) {
        match (actual, predicted) {
            (Label::Ham, Label::Ham) => self.true_negatives += 1,
            (Label::Ham, Label::Spam) => self.false_positives += 1,
            (Label::Spam, Label::Ham) => self.false_negatives += 1,
            (Label::Spam, Label::Spam) => self.true_positives += 1,
        }
    }

    /// Count for one cell.
    pub fn get(&self, actual: Label, predicted: Label) -> usize {
        self.as_rows()[actual.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negatives + self.true_positives, self.total(), "accuracy")
    }

    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
            "precision",
        )
    }

    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
            "recall",
        )
    }

    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            warn!("f1 is ill-defined (precision and recall are both 0); reporting 0");
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }
}

impl From<[[usize; 2]; 2]> for ConfusionMatrix {
    fn from(rows: [[usize; 2]; 2]) -> Self {
        Self {
            true_negatives: rows[0][0],
            false_positives: rows[0][1],
            false_negatives: rows[1][0],
            true_positives: rows[1][1],
        }
    }
}

impl From<ConfusionMatrix> for [[usize; 2]; 2] {
    fn from(matrix: ConfusionMatrix) -> Self {
        matrix.as_rows()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.as_rows().iter().flatten().map(|n| n.to_string().len()).max().unwrap_or(1);
        writeln!(
            f,
            "[[{:>w$} {:>w$}]",
            self.true_negatives,
            self.false_positives,
            w = width
        )?;
        write!(
            f,
            " [{:>w$} {:>w$}]]",
            self.false_negatives,
            self.true_positives,
            w = width
        )
    }
}

fn ratio(numerator: usize, denominator: usize, metric: &str) -> f64 {
    if denominator == 0 {
        warn!("{} is ill-defined (zero denominator); reporting 0", metric);
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Metrics of one training run, persisted next to the artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary_size: usize,
}

impl EvaluationReport {
    pub fn from_confusion(
        confusion_matrix: ConfusionMatrix,
        train_size: usize,
        vocabulary_size: usize,
    ) -> Self {
        Self {
            accuracy: confusion_matrix.accuracy(),
            precision: confusion_matrix.precision(),
            recall: confusion_matrix.recall(),
            f1: confusion_matrix.f1(),
            test_size: confusion_matrix.total(),
            confusion_matrix,
            train_size,
            vocabulary_size,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "Recall: {:.4}", self.recall)?;
        writeln!(f, "F1 Score: {:.4}", self.f1)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "{}", self.confusion_matrix)
    }
}

/// Compares held-out predictions with the true labels.
///
/// # Errors
/// `LengthMismatch` if the slices differ in length.
pub fn evaluate(
    actual: &[Label],
    predicted: &[Label],
    train_size: usize,
    vocabulary_size: usize,
) -> Result<EvaluationReport, EvaluationError> {
    let matrix = ConfusionMatrix::from_labels(actual, predicted)?;
    Ok(EvaluationReport::from_confusion(matrix, train_size, vocabulary_size))
}
