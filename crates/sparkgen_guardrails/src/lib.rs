//! # sparkgen_guardrails
//!
//! Guardrail rule model, layered resolution, and runtime enforcement for sparkgen.
//!
//! This crate provides:
//! - **Rule Model**: Typed guardrail rules (patterns, severity, priority, stages) in YAML
//! - **Resolver**: Merges default, workflow, and agent rule layers with a deterministic tie-break
//! - **Rule Engine**: Applies resolved rules to text at a given stage and runs rule self-tests
//! - **Runtime Policies**: Built-in checks (empty input, banned terms, output length, email scrubbing)
//!
//! ## Example
//!
//! ```rust,no_run
//! use sparkgen_guardrails::{AgentGuardrailConfig, GuardrailConfig, GuardrailResolver};
//!
//! let resolver = GuardrailResolver::new("./my-project");
//! let (defaults, _) = resolver.load_defaults("guardrails/default_guardrails.yaml").unwrap();
//! let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
//!
//! let rules = resolver
//!     .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
//!     .unwrap();
//! println!("{}", GuardrailResolver::serialize_rules_for_debug(&rules).unwrap());
//! ```

pub mod engine;
pub mod error;
pub mod policies;
pub mod resolver;
pub mod rules;

pub use engine::{Finding, GuardrailEngine, GuardrailOutcome, RuleTestReport};
pub use error::{GuardrailError, GuardrailResult};
pub use policies::{GuardrailManager, GuardrailSettings};
pub use resolver::{GuardrailResolver, MergedGuardrails, ResolvedRule};
pub use rules::{
    AgentGuardrailConfig, GuardrailConfig, GuardrailRule, GuardrailSet, Layer, MessageTemplates,
    Mode, RuleTestCase, Severity, Stage,
};
