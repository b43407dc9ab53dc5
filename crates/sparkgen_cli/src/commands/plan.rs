//! Plan command - Show how a workflow would run.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::info;

use sparkgen_spec::{AgentBlueprint, HandoffGraph};

use super::{OutputFormat, SpecArgs};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execution chain plus the blueprint of every agent.
#[derive(Debug, Serialize)]
pub struct ExecutionPlan {
    pub workflow: String,
    pub environment: String,
    pub entry_agent: String,
    pub chain: Vec<String>,
    pub agents: Vec<AgentBlueprint>,
    pub generated_at: String,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let (loader, spec, guardrails) = args.spec.load_resolved()?;

    let graph = HandoffGraph::from_spec(&spec)?;
    let chain = graph.execution_chain(&spec.entry_agent);
    let agents = AgentBlueprint::build_all(&spec, &loader.base_dir(), &guardrails)?;
    info!("Planned {} agent(s), chain length {}", agents.len(), chain.len());

    let plan = ExecutionPlan {
        workflow: spec.name.clone(),
        environment: spec.environment.clone(),
        entry_agent: spec.entry_agent.clone(),
        chain,
        agents,
        generated_at: Utc::now().to_rfc3339(),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&plan)?),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

fn print_plan(plan: &ExecutionPlan) {
    println!("🗺️  Workflow '{}' (environment: {})", plan.workflow, plan.environment);
    println!("   Chain: {}", plan.chain.join(" → "));
    println!();

    for agent in &plan.agents {
        println!("🤖 {} ({})", agent.name, agent.role);
        if agent.tools.is_empty() {
            println!("   Tools: none");
        } else {
            println!("   Tools: {}", agent.tools.join(", "));
        }
        println!(
            "   Memory: {:?}, ttl {}",
            agent.memory.store,
            agent
                .memory
                .ttl_messages
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        for resolved in &agent.guardrails {
            println!(
                "   🛡️  {} [{}] {:?} p{} ({:?})",
                resolved.rule.name,
                resolved.rule.mode.as_str(),
                resolved.rule.severity,
                resolved.rule.priority,
                resolved.layer
            );
        }
        if !agent.handoff_targets.is_empty() {
            println!("   Hands off to: {}", agent.handoff_targets.join(", "));
        }
        println!();
    }
}
