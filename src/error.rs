//! Error types for model loading, scoring, streaming and batch evaluation.

use std::path::PathBuf;

use thiserror::Error;

use crate::evaluator::stream::EvaluatorState;
use crate::sensor::LabeledSample;

/// Raised once at startup when a model artifact cannot be used.
#[derive(Debug, Error)]
#[error("failed to load {artifact} from {path}: {reason}")]
pub struct ModelLoadError {
    pub artifact: &'static str,
    pub path: PathBuf,
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(
        artifact: &'static str,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            artifact,
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("dimension mismatch: expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: EvaluatorState,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("failed to open anomaly log {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sample was classified and committed to the window and counter,
    /// but its anomaly record could not be persisted.
    #[error("anomaly at {} was not persisted: {source}", labeled.sample.timestamp)]
    LogAppend {
        labeled: LabeledSample,
        #[source]
        source: std::io::Error,
    },
}

impl EvaluatorError {
    /// Warning-level errors carry a classification that was already committed.
    pub fn is_warning(&self) -> bool {
        matches!(self, EvaluatorError::LogAppend { .. })
    }
}

/// Which required columns a batch row lacks or could not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub row: usize,
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaReport {
    pub missing_header: Vec<String>,
    pub rows: Vec<RowIssue>,
}

impl SchemaReport {
    pub fn is_empty(&self) -> bool {
        self.missing_header.is_empty() && self.rows.is_empty()
    }
}

impl std::fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.missing_header.is_empty() {
            write!(f, "missing columns: {}", self.missing_header.join(", "))?;
        }
        for (i, issue) in self.rows.iter().enumerate() {
            if i > 0 || !self.missing_header.is_empty() {
                write!(f, "; ")?;
            }
            write!(f, "row {}", issue.row)?;
            if !issue.missing.is_empty() {
                write!(f, " missing {}", issue.missing.join(", "))?;
            }
            if !issue.invalid.is_empty() {
                write!(f, " non-numeric {}", issue.invalid.join(", "))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("schema error: {0}")]
    Schema(SchemaReport),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type EvaluatorResult<T> = Result<T, EvaluatorError>;
pub type BatchResult<T> = Result<T, BatchError>;
