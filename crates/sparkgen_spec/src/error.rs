//! Error types for workflow loading and validation.

use std::path::PathBuf;
use thiserror::Error;

use sparkgen_guardrails::GuardrailError;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while loading or validating a workflow spec.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Workflow spec not found at path: {0}")]
    NotFound(PathBuf),

    #[error("Spec validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid spec format in file {path}: {message}")]
    InvalidFormat { path: PathBuf, message: String },

    #[error("Unknown template '{name}'. Available templates: {available}")]
    UnknownTemplate { name: String, available: String },

    #[error("Destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpecError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        SpecError::ValidationFailed(message.into())
    }

    /// Whether the error means the workflow description itself is invalid.
    pub fn is_validation(&self) -> bool {
        match self {
            SpecError::ValidationFailed(_) | SpecError::InvalidFormat { .. } => true,
            SpecError::Guardrail(e) => e.is_validation(),
            _ => false,
        }
    }
}
