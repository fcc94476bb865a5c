use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod loader;
mod split;

pub use loader::{load_csv, parse_csv};
pub use split::{train_test_split, Split};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Input is not valid {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row} has {found} column(s); at least 2 (label, text) are required")]
    MissingColumns { row: usize, found: usize },
    #[error("Row {row} has unknown label '{value}' (expected 'ham' or 'spam')")]
    UnknownLabel { row: usize, value: String },
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
}

/// Binary class of a message. The discriminant is the label code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ham = 0,
    Spam = 1,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Ham, Label::Spam];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ham),
            1 => Some(Self::Spam),
            _ => None,
        }
    }

    /// Maps the raw label column. Matching is exact, as in the source corpus.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "ham" => Some(Self::Ham),
            "spam" => Some(Self::Spam),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ham => "ham",
            Self::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled message. `text` is kept exactly as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub label: Label,
    pub text: String,
}

impl Record {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// An ordered collection of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.records.iter().map(|r| r.label).collect()
    }

    /// Number of records carrying `label`.
    pub fn count(&self, label: Label) -> usize {
        self.records.iter().filter(|r| r.label == label).count()
    }

    /// Picks the records at `indices`, in that order.
    pub(crate) fn select(&self, indices: &[usize]) -> Dataset {
        Dataset::new(indices.iter().map(|&i| self.records[i].clone()).collect())
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
