//! Loader for `workflow.yaml` files.
//!
//! Loading selects an environment, deep-merges that environment's overrides
//! onto the document, parses the result into a [`WorkflowSpec`], and then
//! validates every cross-reference the workflow makes.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::error::{SpecError, SpecResult};
use crate::merge::deep_merge;
use crate::models::{WorkflowOverrides, WorkflowSpec, DEFAULT_ENVIRONMENT};
use crate::validator::{ResolvedGuardrails, SpecValidator};

/// Load, validate, and resolve a workflow file into a typed spec.
pub struct WorkflowSpecLoader {
    spec_path: PathBuf,
    environment: Option<String>,
}

impl WorkflowSpecLoader {
    pub fn new(spec_path: impl Into<PathBuf>) -> Self {
        Self {
            spec_path: spec_path.into(),
            environment: None,
        }
    }

    /// Select an environment explicitly instead of the one named in the file.
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.filter(|e| !e.is_empty());
        self
    }

    pub fn spec_path(&self) -> &Path {
        &self.spec_path
    }

    /// Directory that relative paths in the workflow are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.spec_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load the workflow and run every validation, failing on the first problem.
    pub fn load(&self) -> SpecResult<WorkflowSpec> {
        self.load_resolved().map(|(spec, _)| spec)
    }

    /// Load the workflow and return it with every agent's resolved guardrails.
    pub fn load_resolved(&self) -> SpecResult<(WorkflowSpec, ResolvedGuardrails)> {
        let spec = self.load_unchecked()?;
        let base_dir = self.base_dir();

        SpecValidator::validate_prompts_and_context(&spec, &base_dir)?;
        SpecValidator::validate_tool_references(&spec)?;
        SpecValidator::validate_handoffs(&spec)?;
        let guardrails = SpecValidator::validate_guardrails(&spec, &base_dir)?;

        info!("Loaded workflow '{}' ({} agents, environment {})", spec.name, spec.agents.len(), spec.environment);
        Ok((spec, guardrails))
    }

    /// Parse, merge overrides, and apply model-level checks only.
    ///
    /// Cross-reference checks (files, tools, handoffs, guardrails) are skipped.
    pub fn load_unchecked(&self) -> SpecResult<WorkflowSpec> {
        if !self.spec_path.exists() {
            return Err(SpecError::NotFound(self.spec_path.clone()));
        }

        debug!("Reading workflow spec from {:?}", self.spec_path);
        let content = fs::read_to_string(&self.spec_path)?;
        let raw: Value = serde_yaml::from_str(&content).map_err(|e| self.invalid(e.to_string()))?;
        let Value::Mapping(mut document) = raw else {
            return Err(SpecError::validation("workflow.yaml must parse into a mapping."));
        };

        let environments = document
            .remove("environments")
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Mapping(Mapping::new()));
        if !environments.is_mapping() {
            return Err(SpecError::validation("environments must be a mapping of name to overrides."));
        }

        let selected = self.select_environment(&document);
        let overrides = match environments.get(selected.as_str()) {
            Some(v) if !v.is_null() => v.clone(),
            _ => {
                if selected != DEFAULT_ENVIRONMENT {
                    warn!("No overrides defined for environment '{}'", selected);
                }
                Value::Mapping(Mapping::new())
            }
        };
        self.check_overrides(&selected, &overrides)?;

        let mut merged = deep_merge(&Value::Mapping(document), &overrides);
        if let Value::Mapping(map) = &mut merged {
            map.insert(Value::from("environment"), Value::from(selected.clone()));
            map.insert(Value::from("environments"), environments);
        }

        let mut spec: WorkflowSpec = serde_yaml::from_value(merged).map_err(|e| self.invalid(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    fn select_environment(&self, document: &Mapping) -> String {
        self.environment
            .clone()
            .or_else(|| {
                document
                    .get("environment")
                    .and_then(Value::as_str)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    /// Overrides must have the shape of [`WorkflowOverrides`]; only the keys they set are merged.
    fn check_overrides(&self, environment: &str, overrides: &Value) -> SpecResult<()> {
        serde_yaml::from_value::<WorkflowOverrides>(overrides.clone())
            .map(|_| ())
            .map_err(|e| self.invalid(format!("invalid overrides for environment '{}': {}", environment, e)))
    }

    fn invalid(&self, message: String) -> SpecError {
        SpecError::InvalidFormat {
            path: self.spec_path.clone(),
            message,
        }
    }
}
