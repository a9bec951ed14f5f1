//! Custom error types and handling
//!
//! This module defines the engine's error types. Every failure surfaced to a
//! caller carries a stable machine-readable code next to the human-readable
//! message; nothing is silently swallowed except best-effort notification and
//! broadcast delivery, which the emit sites log and discard.

use serde::Serialize;

/// Engine-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // State machine violations
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // Eligibility failures
    #[error("Not eligible: {0}")]
    NotEligible(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Uniqueness violations
    #[error("Duplicate assignment: submission {0} is already assigned")]
    DuplicateAssignment(uuid::Uuid),

    #[error("Duplicate vote: judge {0} has already voted")]
    DuplicateVote(uuid::Uuid),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

/// Structured error payload for callers that serialize failures
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "INVALID_STATE",
            Self::NotEligible(_) => "NOT_ELIGIBLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::DuplicateAssignment(_) => "DUPLICATE_ASSIGNMENT",
            Self::DuplicateVote(_) => "DUPLICATE_VOTE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Build the serializable error payload
    pub fn details(&self) -> ErrorDetails {
        // Internal errors are logged in full but not exposed verbatim
        let message = match self {
            Self::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        ErrorDetails {
            code: self.error_code().to_string(),
            message,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            AppError::InvalidState("round is closed".into()).error_code(),
            "INVALID_STATE"
        );
        assert_eq!(
            AppError::DuplicateVote(uuid::Uuid::nil()).error_code(),
            "DUPLICATE_VOTE"
        );
        assert_eq!(
            AppError::NotEligible("no judges".into()).error_code(),
            "NOT_ELIGIBLE"
        );
    }

    #[test]
    fn test_details_preserve_message() {
        let details = AppError::NotFound("round not found".to_string()).details();
        assert_eq!(details.code, "NOT_FOUND");
        assert!(details.message.contains("round not found"));
    }
}
