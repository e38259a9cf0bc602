//! Claims domain errors

use thiserror::Error;

/// Errors that can occur in the claims domain
///
/// Malformed claim content is never an error here; it is reported through
/// the reasons and warnings of a validation result.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Rule already registered: {0}")]
    DuplicateRule(String),

    #[error("Invalid claim payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for ClaimError {
    fn from(err: serde_json::Error) -> Self {
        ClaimError::InvalidPayload(err.to_string())
    }
}
