//! Per-agent runtime blueprints.
//!
//! A blueprint is everything a runtime needs to instantiate one agent from a
//! validated spec: the composed prompt, the bound tools, the memory window, the
//! resolved guardrail rules, and the agents it hands off to.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use sparkgen_guardrails::{GuardrailEngine, GuardrailManager, GuardrailResult, GuardrailSettings, ResolvedRule};

use crate::error::SpecResult;
use crate::graph::HandoffGraph;
use crate::mcp::{active_tools, qualified_tool_name};
use crate::models::{AgentSpec, MemoryWindow, WorkflowSpec};
use crate::validator::ResolvedGuardrails;

#[derive(Debug, Clone, Serialize)]
pub struct AgentBlueprint {
    pub name: String,
    pub role: String,
    pub prompt: String,
    pub tools: Vec<String>,
    pub memory: MemoryWindow,
    pub guardrails: Vec<ResolvedRule>,
    pub handoff_targets: Vec<String>,
}

impl AgentBlueprint {
    /// Build blueprints for every agent, in declaration order.
    pub fn build_all(
        spec: &WorkflowSpec,
        base_dir: &Path,
        guardrails: &ResolvedGuardrails,
    ) -> SpecResult<Vec<AgentBlueprint>> {
        let graph = HandoffGraph::from_spec(spec)?;
        spec.agents
            .iter()
            .map(|agent| Self::build(spec, agent, base_dir, guardrails, &graph))
            .collect()
    }

    fn build(
        spec: &WorkflowSpec,
        agent: &AgentSpec,
        base_dir: &Path,
        guardrails: &ResolvedGuardrails,
        graph: &HandoffGraph,
    ) -> SpecResult<Self> {
        debug!("Building blueprint for agent '{}'", agent.name);
        let prompt = compose_prompt(agent, base_dir)?;
        let memory = if agent.memory.short_term {
            spec.memory.short_term.clone()
        } else {
            spec.memory.long_term.clone()
        };

        Ok(Self {
            name: agent.name.clone(),
            role: agent.role.clone(),
            prompt,
            tools: bind_tools(spec, agent),
            memory,
            guardrails: guardrails.rules_for(&agent.name).to_vec(),
            handoff_targets: graph.targets(&agent.name).to_vec(),
        })
    }

    /// Runtime guardrails for this agent: built-in policies plus its resolved rules.
    pub fn guardrail_manager(&self, settings: &GuardrailSettings) -> GuardrailResult<GuardrailManager> {
        let engine = GuardrailEngine::new(&self.guardrails)?;
        Ok(GuardrailManager::from_settings(settings).with_engine(engine))
    }
}

/// `<role>: <context>\n\n<prompt>`, with the context part omitted when absent.
pub fn compose_prompt(agent: &AgentSpec, base_dir: &Path) -> SpecResult<String> {
    let prompt = fs::read_to_string(base_dir.join(&agent.prompt_file))?;
    let body = match &agent.context_file {
        Some(context_file) => {
            let context = fs::read_to_string(base_dir.join(context_file))?;
            format!("{}\n\n{}", context, prompt)
        }
        None => prompt,
    };
    Ok(format!("{}: {}", agent.role, body))
}

/// Tools bound to an agent at runtime.
///
/// Builtin names bind as-is. MCP tools bind under their qualified name, whether
/// the agent lists the bare or the qualified form, and only when
/// `exposed_mcp_tools` is empty or lists them.
pub fn bind_tools(spec: &WorkflowSpec, agent: &AgentSpec) -> Vec<String> {
    let exposed = &spec.tools.exposed_mcp_tools;
    let mut bound: Vec<String> = Vec::new();

    for requested in &agent.tools {
        let resolved = if spec.tools.builtin.contains(requested) {
            Some(requested.clone())
        } else {
            active_tools(&spec.tools.mcp_connectors)
                .map(|(c, t)| (t, qualified_tool_name(&c.name, &t.name)))
                .find(|(t, qualified)| &t.name == requested || qualified == requested)
                .map(|(_, qualified)| qualified)
                .filter(|qualified| exposed.is_empty() || exposed.contains(qualified))
        };

        if let Some(name) = resolved {
            if !bound.contains(&name) {
                bound.push(name);
            }
        }
    }

    bound
}
