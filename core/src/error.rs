use std::fmt;
use thiserror::Error;

use crate::types::CaseKey;

/// Result type for lesionmatch operations
pub type Result<T> = std::result::Result<T, LesionMatchError>;

/// Error types for lesionmatch operations
#[derive(Error, Debug)]
pub enum LesionMatchError {
    /// Enclosing-sphere fit over an unusable point set
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Malformed lesion or response fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lesions or responses handed to the matcher outside their case
    #[error("Matching error: {0}")]
    Matching(String),

    /// Rater/case pairs that contributed no records
    #[error("Incomplete evaluation: {} missing rater/case pair(s)", .0.len())]
    Completeness(Vec<CompletenessIssue>),

    /// Experiment directory tree does not follow the expected layout
    #[error("Layout error: {0}")]
    Layout(String),

    /// Annotation file could not be interpreted
    #[error("Annotation error: {0}")]
    Annotation(String),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    Dicom(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A rater that was assigned a case but contributed nothing for it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct CompletenessIssue {
    pub rater: String,
    pub case: CaseKey,
}

impl fmt::Display for CompletenessIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rater '{}' has no records for case {}", self.rater, self.case)
    }
}

impl From<dicom_object::ReadError> for LesionMatchError {
    fn from(e: dicom_object::ReadError) -> Self {
        LesionMatchError::Dicom(format!("{}", e))
    }
}
