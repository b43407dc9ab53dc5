//! Error types for the guardrails module.

use thiserror::Error;

/// Result type alias for guardrail operations.
pub type GuardrailResult<T> = Result<T, GuardrailError>;

/// Errors that can occur while loading, resolving, or enforcing guardrails.
#[derive(Error, Debug)]
pub enum GuardrailError {
    #[error("Guardrail validation failed: {0}")]
    ValidationFailed(String),

    #[error("Guardrail defaults file not found: {0}")]
    DefaultsNotFound(String),

    #[error("Guardrail set(s) referenced but not defined: {0}")]
    UnknownSets(String),

    #[error("Invalid pattern in rule '{rule}': {message}")]
    InvalidPattern { rule: String, message: String },

    #[error("Guardrail violation: {0}")]
    Violation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GuardrailError {
    /// Whether this error describes an invalid configuration rather than an I/O or runtime problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GuardrailError::ValidationFailed(_)
                | GuardrailError::DefaultsNotFound(_)
                | GuardrailError::UnknownSets(_)
                | GuardrailError::InvalidPattern { .. }
                | GuardrailError::Yaml(_)
        )
    }
}
