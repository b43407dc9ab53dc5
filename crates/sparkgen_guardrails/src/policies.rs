//! Built-in runtime guardrail policies.
//!
//! These checks run around every agent call regardless of the declarative
//! rules: pre checks on user input, scrubbers and post checks on model output.
//! A [`GuardrailEngine`] with resolved rules can be layered on top.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::GuardrailEngine;
use crate::error::{GuardrailError, GuardrailResult};
use crate::rules::Stage;

pub const DEFAULT_MAX_OUTPUT_LEN: usize = 2000;
pub const BANNED_TERMS_VAR: &str = "GUARDRAIL_BANNED_TERMS";
pub const MAX_OUTPUT_LEN_VAR: &str = "GUARDRAIL_MAX_OUTPUT_LEN";

/// Settings for the built-in policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailSettings {
    #[serde(default)]
    pub banned_terms: Vec<String>,
    #[serde(default = "default_max_output_len")]
    pub max_output_len: usize,
}

fn default_max_output_len() -> usize {
    DEFAULT_MAX_OUTPUT_LEN
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            banned_terms: Vec::new(),
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }
}

impl GuardrailSettings {
    /// Read settings from `GUARDRAIL_BANNED_TERMS` and `GUARDRAIL_MAX_OUTPUT_LEN`.
    pub fn from_env() -> GuardrailResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GuardrailResult<Self> {
        let banned_terms = lookup(BANNED_TERMS_VAR)
            .map(|raw| parse_terms(&raw))
            .unwrap_or_default();

        let max_output_len = match lookup(MAX_OUTPUT_LEN_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
                GuardrailError::ValidationFailed(format!("{} must be a positive integer, got '{}'", MAX_OUTPUT_LEN_VAR, raw))
            })?,
            _ => DEFAULT_MAX_OUTPUT_LEN,
        };

        Ok(Self {
            banned_terms,
            max_output_len,
        })
    }
}

fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checks applied to user input before the agent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCheck {
    BlockEmpty,
    BannedTerms(Vec<String>),
}

impl InputCheck {
    fn run(&self, text: &str) -> GuardrailResult<()> {
        match self {
            InputCheck::BlockEmpty => {
                if text.trim().is_empty() {
                    return Err(GuardrailError::Violation("Empty input is not allowed.".to_string()));
                }
            }
            InputCheck::BannedTerms(terms) => {
                let lowered = text.to_lowercase();
                if terms.iter().any(|t| lowered.contains(&t.to_lowercase())) {
                    return Err(GuardrailError::Violation("Input contains banned terms.".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Checks applied to model output after scrubbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCheck {
    MaxLength(usize),
}

impl OutputCheck {
    fn run(&self, text: &str) -> GuardrailResult<()> {
        match self {
            OutputCheck::MaxLength(max) => {
                if text.chars().count() > *max {
                    return Err(GuardrailError::Violation(format!("Output exceeds {} characters.", max)));
                }
            }
        }
        Ok(())
    }
}

/// Rewrites applied to model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scrubber {
    Emails,
}

impl Scrubber {
    fn apply(&self, text: &str) -> String {
        match self {
            Scrubber::Emails => scrub_emails(text),
        }
    }
}

/// Redact email-like strings.
pub fn scrub_emails(text: &str) -> String {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+").expect("email pattern is valid")
    });
    re.replace_all(text, "[REDACTED_EMAIL]").into_owned()
}

/// Runs the built-in policies and, optionally, a rule engine.
#[derive(Default)]
pub struct GuardrailManager {
    pre: Vec<InputCheck>,
    post: Vec<OutputCheck>,
    scrubbers: Vec<Scrubber>,
    engine: Option<GuardrailEngine>,
}

impl GuardrailManager {
    pub fn new(pre: Vec<InputCheck>, post: Vec<OutputCheck>, scrubbers: Vec<Scrubber>) -> Self {
        Self {
            pre,
            post,
            scrubbers,
            engine: None,
        }
    }

    /// Default policies: block empty input, optional banned terms, output length limit, email scrubbing.
    pub fn from_settings(settings: &GuardrailSettings) -> Self {
        let mut pre = vec![InputCheck::BlockEmpty];
        if !settings.banned_terms.is_empty() {
            pre.push(InputCheck::BannedTerms(settings.banned_terms.clone()));
        }
        Self::new(
            pre,
            vec![OutputCheck::MaxLength(settings.max_output_len)],
            vec![Scrubber::Emails],
        )
    }

    /// Layer declarative rules on top of the built-in policies.
    pub fn with_engine(mut self, engine: GuardrailEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn engine(&self) -> Option<&GuardrailEngine> {
        self.engine.as_ref()
    }

    /// Validate user input; returns the input after rule redaction.
    pub fn run_pre(&self, input: &str) -> GuardrailResult<String> {
        for check in &self.pre {
            check.run(input)?;
        }
        self.apply_engine(Stage::Input, input.to_string())
    }

    /// Sanitize and validate model output.
    pub fn run_post(&self, output: &str) -> GuardrailResult<String> {
        let mut sanitized = output.to_string();
        for scrubber in &self.scrubbers {
            sanitized = scrubber.apply(&sanitized);
        }
        let sanitized = self.apply_engine(Stage::Output, sanitized)?;
        for check in &self.post {
            check.run(&sanitized)?;
        }
        Ok(sanitized)
    }

    /// Validate a tool call payload against tool-stage rules.
    pub fn run_tool(&self, payload: &str) -> GuardrailResult<String> {
        self.apply_engine(Stage::Tool, payload.to_string())
    }

    fn apply_engine(&self, stage: Stage, text: String) -> GuardrailResult<String> {
        let engine = match &self.engine {
            Some(engine) => engine,
            None => return Ok(text),
        };

        let outcome = engine.check(stage, &text);
        if outcome.blocked() {
            let message = engine.refusal_for(&outcome).unwrap_or_else(|| outcome.summary());
            return Err(GuardrailError::Violation(message));
        }
        debug!("Guardrail outcome at {:?}: {}", stage, outcome.summary());
        Ok(outcome.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{GuardrailRule, Mode};

    #[test]
    fn test_settings_from_lookup() {
        let settings = GuardrailSettings::from_lookup(|key| match key {
            BANNED_TERMS_VAR => Some(" foo, ,Bar ".to_string()),
            MAX_OUTPUT_LEN_VAR => Some("10".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(settings.banned_terms, vec!["foo", "Bar"]);
        assert_eq!(settings.max_output_len, 10);
    }

    #[test]
    fn test_settings_invalid_length() {
        let result = GuardrailSettings::from_lookup(|key| (key == MAX_OUTPUT_LEN_VAR).then(|| "lots".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_policies() {
        let settings = GuardrailSettings {
            banned_terms: vec!["forbidden".into()],
            max_output_len: 40,
        };
        let manager = GuardrailManager::from_settings(&settings);

        assert!(manager.run_pre("  ").is_err());
        assert!(manager.run_pre("This is FORBIDDEN").is_err());
        assert_eq!(manager.run_pre("hello").unwrap(), "hello");

        let out = manager.run_post("mail me at jane.doe@example.com").unwrap();
        assert_eq!(out, "mail me at [REDACTED_EMAIL]");
        assert!(manager.run_post(&"x".repeat(41)).is_err());
    }

    #[test]
    fn test_engine_block_uses_refusal_template() {
        let mut rule = GuardrailRule::new("no_secrets", "security")
            .with_mode(Mode::Block)
            .with_pattern("(?i)password");
        rule.message_templates.refusal = Some("I can't share credentials.".into());
        let engine = GuardrailEngine::from_rules(vec![rule]).unwrap();
        let manager = GuardrailManager::from_settings(&GuardrailSettings::default()).with_engine(engine);

        match manager.run_post("the password is hunter2") {
            Err(GuardrailError::Violation(msg)) => assert_eq!(msg, "I can't share credentials."),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
