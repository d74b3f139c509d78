//! Error types for the policy engine.

use thiserror::Error;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while loading, validating or reducing policies.
///
/// Evaluation itself never fails: unknown comparisons deny, unresolvable
/// attribute paths stay residual and unknown operations deny.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy document could not be parsed.
    #[error("Failed to parse policy: {0}")]
    ParseError(String),

    /// Policy or reduce options violate the policy schema.
    #[error("Policy validation error: {0}")]
    ValidationError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PolicyError {
    /// Builds a validation error anchored at a document location.
    pub(crate) fn invalid(location: impl AsRef<str>, message: impl AsRef<str>) -> Self {
        PolicyError::ValidationError(format!("{} {}", location.as_ref(), message.as_ref()))
    }

    /// Returns true if this error is a schema violation.
    pub fn is_validation(&self) -> bool {
        matches!(self, PolicyError::ValidationError(_))
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            PolicyError::ParseError(err.to_string())
        } else {
            PolicyError::SerializationError(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for PolicyError {
    fn from(err: serde_yaml::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}
