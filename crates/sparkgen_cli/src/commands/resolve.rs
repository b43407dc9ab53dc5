//! Resolve command - Print the resolved guardrail rules per agent.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use tracing::info;

use sparkgen_guardrails::{GuardrailResolver, ResolvedRule};

use super::SpecArgs;

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Only print rules for this agent
    #[arg(short, long)]
    pub agent: Option<String>,
}

pub async fn execute(args: ResolveArgs) -> Result<()> {
    let (_, spec, guardrails) = args.spec.load_resolved()?;

    match &args.agent {
        Some(agent) => {
            if spec.agent(agent).is_none() {
                anyhow::bail!(
                    "Agent '{}' not found. Known agents: {}",
                    agent,
                    spec.agent_names().join(", ")
                );
            }
            let rules = guardrails.rules_for(agent);
            info!("Agent '{}' resolves to {} rule(s)", agent, rules.len());
            println!("{}", GuardrailResolver::serialize_rules_for_debug(rules)?);
        }
        None => {
            let all: BTreeMap<&str, &[ResolvedRule]> = spec
                .agents
                .iter()
                .map(|a| (a.name.as_str(), guardrails.rules_for(&a.name)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }

    Ok(())
}
