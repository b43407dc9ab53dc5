//! CLI command definitions.
//!
//! Each subcommand loads a `workflow.yaml` (or writes one) and reports on it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use sparkgen_spec::{ResolvedGuardrails, WorkflowSpec, WorkflowSpecLoader};

pub mod guardrails;
pub mod init;
pub mod mcp_tools;
pub mod plan;
pub mod resolve;
pub mod schema;
pub mod validate;

/// sparkgen - Spec-as-Code generator for agentic RAG workflows
#[derive(Parser)]
#[command(name = "sparkgen")]
#[command(version, about = "sparkgen - Spec-as-Code generator for agentic RAG workflows")]
#[command(long_about = r#"
sparkgen loads a declarative workflow.yaml, applies environment overrides,
validates every cross-reference, and resolves layered guardrails per agent.

COMMANDS:
  validate      → Load a workflow and report every problem found
  resolve       → Print the resolved guardrail rules per agent
  plan          → Print the handoff chain and per-agent blueprints
  schema        → Export the workflow JSON Schema
  init          → Scaffold a project from a starter template
  mcp-tools     → List function-tool specs from an MCP gateways file
  guardrails    → Run guardrail self-tests or check a piece of text

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a workflow spec
    Validate(validate::ValidateArgs),

    /// Print resolved guardrail rules
    Resolve(resolve::ResolveArgs),

    /// Print the execution plan and agent blueprints
    Plan(plan::PlanArgs),

    /// Export the workflow JSON Schema
    Schema(schema::SchemaArgs),

    /// Scaffold a project from a template
    Init(init::InitArgs),

    /// List MCP function-tool specs
    #[command(name = "mcp-tools")]
    McpTools(mcp_tools::McpToolsArgs),

    /// Guardrail self-tests and ad-hoc checks
    Guardrails(guardrails::GuardrailsArgs),
}

/// Workflow file and environment selection shared by spec-reading commands.
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Path to workflow.yaml
    #[arg(short, long, env = "SPARKGEN_SPEC", default_value = "workflow.yaml")]
    pub spec: PathBuf,

    /// Environment whose overrides are applied
    #[arg(short, long, env = "SPARKGEN_ENV")]
    pub env: Option<String>,
}

impl SpecArgs {
    pub fn loader(&self) -> WorkflowSpecLoader {
        WorkflowSpecLoader::new(&self.spec).with_environment(self.env.clone())
    }

    /// Load with every check applied, returning resolved guardrails as well.
    pub fn load_resolved(&self) -> Result<(WorkflowSpecLoader, WorkflowSpec, ResolvedGuardrails)> {
        let loader = self.loader();
        let (spec, guardrails) = loader
            .load_resolved()
            .with_context(|| format!("Failed to load workflow {:?}", self.spec))?;
        Ok((loader, spec, guardrails))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["sparkgen", "validate", "--spec", "w.yaml", "--env", "prod"]).unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.spec.spec, PathBuf::from("w.yaml"));
                assert_eq!(args.spec.env.as_deref(), Some("prod"));
            }
            _ => panic!("expected validate"),
        }

        let cli = Cli::try_parse_from(["sparkgen", "-v", "guardrails", "check", "--agent", "a1", "--stage", "output", "--text", "hi"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Guardrails(_)));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    fn init_args(dest: &std::path::Path) -> init::InitArgs {
        init::InitArgs {
            template: "rag_agentic".into(),
            from: None,
            dest: Some(dest.to_path_buf()),
            force: false,
            list: false,
        }
    }

    #[tokio::test]
    async fn test_init_then_validate_plan_resolve() {
        let temp = tempfile::tempdir().unwrap();
        init::execute(init_args(temp.path())).await.unwrap();

        let spec = SpecArgs {
            spec: temp.path().join("workflow.yaml"),
            env: Some("staging".into()),
        };
        validate::execute(validate::ValidateArgs {
            spec: spec.clone(),
            json: true,
            strict: false,
        })
        .await
        .unwrap();
        plan::execute(plan::PlanArgs {
            spec: spec.clone(),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
        resolve::execute(resolve::ResolveArgs {
            spec: spec.clone(),
            agent: Some("support".into()),
        })
        .await
        .unwrap();

        let err = resolve::execute(resolve::ResolveArgs {
            spec,
            agent: Some("ghost".into()),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Agent 'ghost' not found"));
    }

    #[tokio::test]
    async fn test_init_refuses_existing_workflow() {
        let temp = tempfile::tempdir().unwrap();
        init::execute(init_args(temp.path())).await.unwrap();

        let err = init::execute(init_args(temp.path())).await.unwrap_err();
        let already_exists = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<sparkgen_spec::SpecError>(),
                Some(sparkgen_spec::SpecError::AlreadyExists(_))
            )
        });
        assert!(already_exists);
    }

    #[tokio::test]
    async fn test_validate_reports_missing_prompt() {
        let temp = tempfile::tempdir().unwrap();
        init::execute(init_args(temp.path())).await.unwrap();
        std::fs::remove_file(temp.path().join("prompts/triage.md")).unwrap();

        let err = validate::execute(validate::ValidateArgs {
            spec: SpecArgs {
                spec: temp.path().join("workflow.yaml"),
                env: None,
            },
            json: false,
            strict: false,
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Validation failed with 1 error(s)"));
    }
}
