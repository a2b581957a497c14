use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level problem found by input validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Validation failed with {} issue(s): {}", .0.len(), join_messages(.0))]
    ValidationFailed(Vec<ValidationIssue>),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanError {
    /// The field-level issues carried by a validation failure, empty otherwise.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            LoanError::ValidationFailed(issues) => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(e: serde_json::Error) -> Self {
        LoanError::SerializationError(e.to_string())
    }
}

fn join_messages(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
