//! # sparkgen_spec
//!
//! Spec-as-Code workflow loading and validation for sparkgen.
//!
//! A `workflow.yaml` declares the agents of a generated project together with
//! their prompts, tools, memory, guardrails, and handoffs. This crate turns that
//! file into a validated [`WorkflowSpec`].
//!
//! ## Features
//!
//! - **Environment Overrides**: Per-environment sections deep-merged onto the base document
//! - **Cross-Reference Validation**: Prompt/context files, tool names, handoff targets
//! - **Handoff Graph**: Cycle detection and the deterministic execution chain
//! - **Guardrails**: Layered rule resolution for every agent (see `sparkgen_guardrails`)
//! - **MCP Tooling**: Gateway configuration and function-tool specs
//! - **Schema Export**: JSON Schema for editor support
//! - **Templates**: Built-in starter projects
//!
//! ## Example
//!
//! ```rust,no_run
//! use sparkgen_spec::WorkflowSpecLoader;
//!
//! let spec = WorkflowSpecLoader::new("./my-project/workflow.yaml")
//!     .with_environment(Some("staging".to_string()))
//!     .load()
//!     .unwrap();
//! println!("{} starts at {}", spec.name, spec.entry_agent);
//! ```

pub mod blueprint;
pub mod error;
pub mod graph;
pub mod loader;
pub mod mcp;
pub mod merge;
pub mod models;
pub mod schema;
pub mod templates;
pub mod validator;

pub use blueprint::AgentBlueprint;
pub use error::{SpecError, SpecResult};
pub use graph::HandoffGraph;
pub use loader::WorkflowSpecLoader;
pub use merge::deep_merge;
pub use models::*;
pub use schema::{export_schema, write_schema};
pub use validator::{ResolvedGuardrails, SpecValidator, ValidationResult};
