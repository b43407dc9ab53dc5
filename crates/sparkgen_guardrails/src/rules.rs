//! Guardrail rules and rule sets.
//!
//! Rules are declared in YAML, either in the defaults file shipped with a
//! project, in the workflow's `guardrails` section, or as per-agent overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{GuardrailError, GuardrailResult};

/// Where a rule is enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Output,
    Tool,
}

/// What happens when a rule matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Block,
    #[default]
    Warn,
    Redact,
    Allow,
}

impl Mode {
    /// Strength of the action when several rules fire on the same text.
    pub fn strength(&self) -> u8 {
        match self {
            Mode::Block => 3,
            Mode::Redact => 2,
            Mode::Warn => 1,
            Mode::Allow => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Block => "block",
            Mode::Warn => "warn",
            Mode::Redact => "redact",
            Mode::Allow => "allow",
        }
    }
}

/// Rule severity levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Lower ranks win ties between rules with the same priority.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

/// The configuration layer a resolved rule came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Agent,
    Workflow,
    Default,
}

impl Layer {
    /// Agent rules outrank workflow rules, which outrank defaults.
    pub fn rank(&self) -> u8 {
        match self {
            Layer::Agent => 0,
            Layer::Workflow => 1,
            Layer::Default => 2,
        }
    }
}

/// Messages surfaced to the end user when a rule fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MessageTemplates {
    #[serde(default)]
    pub refusal: Option<String>,
    #[serde(default)]
    pub escalation: Option<String>,
}

/// An example prompt and the outcome the rule is expected to produce for it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RuleTestCase {
    pub prompt: String,
    pub expected_outcome: Mode,
}

/// A single guardrail rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GuardrailRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Stages this rule applies to
    #[serde(default = "default_stages")]
    pub applies_to: Vec<Stage>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub severity: Severity,
    /// Lower values are evaluated first and win deduplication
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Optional regex patterns for detection
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub policy_references: Vec<String>,
    #[serde(default)]
    pub message_templates: MessageTemplates,
    #[serde(default)]
    pub tests: Vec<RuleTestCase>,
}

fn default_stages() -> Vec<Stage> {
    vec![Stage::Input, Stage::Output]
}

fn default_priority() -> i64 {
    100
}

impl GuardrailRule {
    /// Create a rule with the given name and category and default settings.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            categories: vec![category.into()],
            applies_to: default_stages(),
            mode: Mode::default(),
            severity: Severity::default(),
            priority: default_priority(),
            patterns: Vec::new(),
            tags: Vec::new(),
            policy_references: Vec::new(),
            message_templates: MessageTemplates::default(),
            tests: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.applies_to = stages;
        self
    }

    pub fn applies_to_stage(&self, stage: Stage) -> bool {
        self.applies_to.contains(&stage)
    }

    /// Trim categories and enforce the rule invariants.
    pub fn normalize(&mut self) -> GuardrailResult<()> {
        self.categories = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        if self.categories.is_empty() {
            return Err(GuardrailError::ValidationFailed(format!(
                "Guardrail rule '{}' must declare at least one category.",
                self.name
            )));
        }

        if self.applies_to.is_empty() {
            return Err(GuardrailError::ValidationFailed(format!(
                "Guardrail rule '{}' must specify at least one application stage.",
                self.name
            )));
        }

        Ok(())
    }
}

/// A named, reusable collection of rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GuardrailSet {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Documentation file for this set, relative to the project root
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub rules: Vec<GuardrailRule>,
}

/// Guardrail configuration, used both for the defaults file and the workflow section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GuardrailConfig {
    #[serde(default = "default_defaults_path")]
    pub defaults_path: String,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub workflow_doc: Option<String>,
    /// Sets applied to every agent
    #[serde(default)]
    pub apply_sets: Vec<String>,
    #[serde(default)]
    pub allowed_categories: Vec<String>,
    #[serde(default)]
    pub sets: Vec<GuardrailSet>,
}

pub const DEFAULT_GUARDRAILS_PATH: &str = "guardrails/default_guardrails.yaml";

fn default_defaults_path() -> String {
    DEFAULT_GUARDRAILS_PATH.to_string()
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            defaults_path: default_defaults_path(),
            documentation: None,
            workflow_doc: None,
            apply_sets: Vec::new(),
            allowed_categories: Vec::new(),
            sets: Vec::new(),
        }
    }
}

impl GuardrailConfig {
    /// Parse a guardrail configuration from YAML; an empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> GuardrailResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_value(value)?;
        config.normalize()?;
        Ok(config)
    }

    /// Normalize every rule in every set.
    pub fn normalize(&mut self) -> GuardrailResult<()> {
        for set in &mut self.sets {
            for rule in &mut set.rules {
                rule.normalize()?;
            }
        }
        Ok(())
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Per-agent guardrail selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AgentGuardrailConfig {
    #[serde(default)]
    pub use_sets: Vec<String>,
    /// Agent-level rules; these form the `agent` layer
    #[serde(default)]
    pub overrides: Vec<GuardrailRule>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl AgentGuardrailConfig {
    pub fn normalize(&mut self) -> GuardrailResult<()> {
        for rule in &mut self.overrides {
            rule.normalize()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_yaml() {
        let rule: GuardrailRule = serde_yaml::from_str("name: pii\ncategories: [privacy]").unwrap();
        assert_eq!(rule.mode, Mode::Warn);
        assert_eq!(rule.severity, Severity::Medium);
        assert_eq!(rule.priority, 100);
        assert_eq!(rule.applies_to, vec![Stage::Input, Stage::Output]);
    }

    #[test]
    fn test_normalize_trims_categories() {
        let mut rule = GuardrailRule::new("pii", "  privacy ");
        rule.categories.push("   ".into());
        rule.normalize().unwrap();
        assert_eq!(rule.categories, vec!["privacy".to_string()]);
    }

    #[test]
    fn test_normalize_rejects_blank_categories() {
        let mut rule = GuardrailRule::new("pii", " ");
        assert!(matches!(rule.normalize(), Err(GuardrailError::ValidationFailed(_))));
    }

    #[test]
    fn test_normalize_rejects_empty_stages() {
        let mut rule = GuardrailRule::new("pii", "privacy").with_stages(vec![]);
        assert!(rule.normalize().is_err());
    }

    #[test]
    fn test_ranks() {
        assert!(Severity::Critical.rank() < Severity::Low.rank());
        assert!(Layer::Agent.rank() < Layer::Workflow.rank());
        assert!(Layer::Workflow.rank() < Layer::Default.rank());
        assert!(Mode::Block.strength() > Mode::Redact.strength());
    }

    #[test]
    fn test_empty_config_document() {
        let config = GuardrailConfig::from_yaml("").unwrap();
        assert_eq!(config.defaults_path, DEFAULT_GUARDRAILS_PATH);
        assert!(config.sets.is_empty());
    }
}
