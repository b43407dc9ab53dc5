//! Guardrail rule engine.
//!
//! Applies resolved rules to text at a given stage. Each rule's patterns are
//! compiled once; a rule fires when any of its patterns matches.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GuardrailError, GuardrailResult};
use crate::resolver::ResolvedRule;
use crate::rules::{GuardrailRule, Mode, Severity, Stage};

/// A rule that fired on a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub rule: String,
    pub mode: Mode,
    pub severity: Severity,
}

/// Result of running the engine over one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailOutcome {
    /// Strongest action among the findings
    pub action: Mode,
    /// Text after redaction
    pub text: String,
    pub findings: Vec<Finding>,
}

impl GuardrailOutcome {
    pub fn blocked(&self) -> bool {
        self.action == Mode::Block
    }

    /// One-line description, e.g. `redact (card_numbers, competitors)`.
    pub fn summary(&self) -> String {
        let names: Vec<_> = self.findings.iter().map(|f| f.rule.as_str()).collect();
        format!("{} ({})", self.action.as_str(), names.join(", "))
    }
}

/// Result of a single rule self-test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTestReport {
    pub rule: String,
    pub prompt: String,
    pub expected: Mode,
    pub observed: Mode,
    pub passed: bool,
}

struct CompiledRule {
    rule: GuardrailRule,
    patterns: Vec<Regex>,
}

impl CompiledRule {
    fn compile(rule: GuardrailRule) -> GuardrailResult<Self> {
        let patterns = rule
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| GuardrailError::InvalidPattern {
                    rule: rule.name.clone(),
                    message: format!("'{}': {}", p, e),
                })
            })
            .collect::<GuardrailResult<Vec<_>>>()?;
        Ok(Self { rule, patterns })
    }

    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    fn redact(&self, text: &str) -> String {
        let replacement = format!("[REDACTED:{}]", self.rule.name);
        self.patterns.iter().fold(text.to_string(), |acc, re| {
            re.replace_all(&acc, regex::NoExpand(&replacement)).into_owned()
        })
    }
}

/// Engine over an ordered list of rules.
pub struct GuardrailEngine {
    rules: Vec<CompiledRule>,
}

impl GuardrailEngine {
    /// Compile the given resolved rules, preserving their order.
    pub fn new(rules: &[ResolvedRule]) -> GuardrailResult<Self> {
        Self::from_rules(rules.iter().map(|r| r.rule.clone()))
    }

    pub fn from_rules(rules: impl IntoIterator<Item = GuardrailRule>) -> GuardrailResult<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<GuardrailResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate all rules that apply to `stage` against `text`.
    pub fn check(&self, stage: Stage, text: &str) -> GuardrailOutcome {
        let mut action = Mode::Allow;
        let mut findings = Vec::new();
        let mut current = text.to_string();

        for compiled in self.rules.iter().filter(|c| c.rule.applies_to_stage(stage)) {
            if !compiled.matches(&current) {
                continue;
            }
            let rule = &compiled.rule;
            debug!("Guardrail rule '{}' matched at {:?} stage", rule.name, stage);

            if rule.mode == Mode::Redact {
                current = compiled.redact(&current);
            }
            if rule.mode.strength() > action.strength() {
                action = rule.mode;
            }
            findings.push(Finding {
                rule: rule.name.clone(),
                mode: rule.mode,
                severity: rule.severity,
            });
        }

        if action == Mode::Warn {
            warn!("Guardrail warning at {:?} stage: {} finding(s)", stage, findings.len());
        }

        GuardrailOutcome {
            action,
            text: current,
            findings,
        }
    }

    /// Refusal message configured on the first blocking rule among the findings.
    pub fn refusal_for(&self, outcome: &GuardrailOutcome) -> Option<String> {
        outcome
            .findings
            .iter()
            .filter(|f| f.mode == Mode::Block)
            .find_map(|f| {
                self.rules
                    .iter()
                    .find(|c| c.rule.name == f.rule)
                    .and_then(|c| c.rule.message_templates.refusal.clone())
            })
    }

    /// Run the example prompts declared on each rule.
    pub fn run_self_tests(&self) -> Vec<RuleTestReport> {
        let mut reports = Vec::new();
        for compiled in &self.rules {
            for case in &compiled.rule.tests {
                let observed = if compiled.matches(&case.prompt) {
                    compiled.rule.mode
                } else {
                    Mode::Allow
                };
                reports.push(RuleTestReport {
                    rule: compiled.rule.name.clone(),
                    prompt: case.prompt.clone(),
                    expected: case.expected_outcome,
                    observed,
                    passed: observed == case.expected_outcome,
                });
            }
        }
        reports
    }
}
