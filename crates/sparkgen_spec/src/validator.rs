//! Cross-reference validation for workflow specs.
//!
//! Each check fails fast with a [`SpecError`]; [`SpecValidator::validate_all`]
//! runs every check and collects the failures into a [`ValidationResult`].

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use tracing::{debug, info};

use sparkgen_guardrails::{GuardrailResolver, MergedGuardrails, ResolvedRule};

use crate::error::{SpecError, SpecResult};
use crate::graph::HandoffGraph;
use crate::mcp::qualified_tool_name;
use crate::models::WorkflowSpec;

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record the outcome of one check.
    fn record<T>(&mut self, outcome: SpecResult<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.add_error(e.to_string());
                None
            }
        }
    }
}

/// Guardrails merged across layers and resolved for every agent.
#[derive(Debug, Clone)]
pub struct ResolvedGuardrails {
    pub merged: MergedGuardrails,
    pub per_agent: BTreeMap<String, Vec<ResolvedRule>>,
}

impl ResolvedGuardrails {
    pub fn rules_for(&self, agent: &str) -> &[ResolvedRule] {
        self.per_agent.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Validator for workflow specs.
pub struct SpecValidator;

impl SpecValidator {
    /// Run every check, collecting failures instead of stopping at the first.
    pub fn validate_all(spec: &WorkflowSpec, base_dir: &Path) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.record(Self::validate_prompts_and_context(spec, base_dir));
        result.record(Self::validate_tool_references(spec));
        result.record(Self::validate_handoffs(spec));
        result.record(Self::validate_guardrails(spec, base_dir));

        if spec.description.is_none() {
            result.add_warning("Workflow description is recommended");
        }
        if !spec.environments.is_empty() && !spec.environments.contains_key(&spec.environment) {
            result.add_warning(format!(
                "Environment '{}' has no overrides defined",
                spec.environment
            ));
        }
        for agent in &spec.agents {
            let reachable = agent.name == spec.entry_agent || spec.handoffs.iter().any(|h| h.target == agent.name);
            if !reachable {
                result.add_warning(format!(
                    "Agent '{}' is neither the entry agent nor a handoff target",
                    agent.name
                ));
            }
        }

        result
    }

    /// Every prompt, agent context, and knowledge base context file must exist relative to `base_dir`.
    pub fn validate_prompts_and_context(spec: &WorkflowSpec, base_dir: &Path) -> SpecResult<()> {
        let agent_files = spec
            .agents
            .iter()
            .flat_map(|agent| std::iter::once(&agent.prompt_file).chain(agent.context_file.iter()));
        let kb_files = spec.rag.knowledge_bases.iter().flat_map(|kb| kb.contexts.iter());

        let missing: BTreeSet<&str> = agent_files
            .chain(kb_files)
            .filter(|file| !base_dir.join(file).exists())
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(SpecError::validation(format!(
                "Prompt/context files missing: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(())
    }

    /// Names an agent may list in its `tools`.
    ///
    /// Inactive tools are left out; active tools on a disabled connector still count.
    pub fn tool_registry(spec: &WorkflowSpec) -> HashSet<String> {
        let mut names: HashSet<String> = spec.tools.builtin.iter().cloned().collect();
        for connector in &spec.tools.mcp_connectors {
            for tool in connector.tools.iter().filter(|t| t.active) {
                names.insert(tool.name.clone());
                names.insert(qualified_tool_name(&connector.name, &tool.name));
            }
        }
        names
    }

    /// Every tool an agent references must be registered.
    pub fn validate_tool_references(spec: &WorkflowSpec) -> SpecResult<()> {
        let registry = Self::tool_registry(spec);
        debug!("Tool registry has {} name(s)", registry.len());

        for agent in &spec.agents {
            let unknown: Vec<&str> = agent
                .tools
                .iter()
                .filter(|t| !registry.contains(t.as_str()))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() {
                return Err(SpecError::validation(format!(
                    "Agent '{}' references unknown tools: {}",
                    agent.name,
                    unknown.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Handoffs must reference known agents and must not form a cycle.
    pub fn validate_handoffs(spec: &WorkflowSpec) -> SpecResult<HandoffGraph> {
        let graph = HandoffGraph::from_spec(spec)?;
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    /// Load defaults, merge layers, check docs, and resolve every agent's rules.
    pub fn validate_guardrails(spec: &WorkflowSpec, base_dir: &Path) -> SpecResult<ResolvedGuardrails> {
        let resolver = GuardrailResolver::new(base_dir);
        let (defaults, _) = resolver.load_defaults(&spec.guardrails.defaults_path)?;
        let merged = resolver.merge_configs(&defaults, &spec.guardrails);

        let agent_configs: Vec<_> = spec.agents.iter().map(|a| &a.guardrails).collect();
        resolver.validate_docs(&merged, &agent_configs)?;

        let mut per_agent = BTreeMap::new();
        for agent in &spec.agents {
            let rules = resolver.resolve_agent_rules(&merged, &agent.guardrails)?;
            per_agent.insert(agent.name.clone(), rules);
        }

        info!("Guardrails resolved for {} agent(s)", per_agent.len());
        Ok(ResolvedGuardrails { merged, per_agent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentSpec, HandoffRule, McpConnector, McpTool};

    fn spec() -> WorkflowSpec {
        serde_yaml::from_str(
            r#"
name: demo
entry_agent: a1
agents:
  - name: a1
    role: alpha
    prompt_file: prompts/a1.md
    tools: [get_delivery_date]
"#,
        )
        .unwrap()
    }

    fn agent(name: &str) -> AgentSpec {
        let mut a = spec().agents.remove(0);
        a.name = name.into();
        a
    }

    #[test]
    fn test_unknown_tool() {
        let mut spec = spec();
        spec.agents[0].tools.push("missing_tool".into());
        let err = SpecValidator::validate_tool_references(&spec).unwrap_err();
        assert!(err.to_string().contains("Agent 'a1' references unknown tools: missing_tool"));
    }

    #[test]
    fn test_mcp_tool_names_registered() {
        let mut spec = spec();
        let mut connector = McpConnector::new("Docs Gateway");
        connector.tools.push(McpTool {
            name: "Search".into(),
            resource: "docs.search".into(),
            description: None,
            active: true,
            rate_limit_per_minute: None,
        });
        connector.tools.push(McpTool {
            name: "disabled".into(),
            resource: "docs.disabled".into(),
            description: None,
            active: false,
            rate_limit_per_minute: None,
        });
        spec.tools.mcp_connectors.push(connector);
        spec.agents[0].tools = vec!["Search".into(), "mcp__docs_gateway__search".into()];
        assert!(SpecValidator::validate_tool_references(&spec).is_ok());

        spec.agents[0].tools = vec!["disabled".into()];
        assert!(SpecValidator::validate_tool_references(&spec).is_err());
    }

    #[test]
    fn test_inactive_connector_tools_still_registered() {
        let mut spec = spec();
        let mut connector = McpConnector::new("Docs Gateway");
        connector.active = false;
        connector.tools.push(McpTool {
            name: "search".into(),
            resource: "docs.search".into(),
            description: None,
            active: true,
            rate_limit_per_minute: None,
        });
        spec.tools.mcp_connectors.push(connector);
        spec.agents[0].tools = vec!["search".into(), "mcp__docs_gateway__search".into()];

        assert!(SpecValidator::validate_tool_references(&spec).is_ok());
        assert!(crate::mcp::active_tools(&spec.tools.mcp_connectors).next().is_none());
    }

    #[test]
    fn test_handoff_unknown_agent() {
        let mut spec = spec();
        spec.handoffs.push(HandoffRule::new("a1", "ghost"));
        let err = SpecValidator::validate_handoffs(&spec).unwrap_err();
        assert!(err.to_string().contains("a1 -> ghost"));
    }

    #[test]
    fn test_handoff_cycle() {
        let mut spec = spec();
        spec.agents.push(agent("a2"));
        spec.handoffs = vec![HandoffRule::new("a1", "a2"), HandoffRule::new("a2", "a1")];
        let err = SpecValidator::validate_handoffs(&spec).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Circular agent handoff"));
    }

    #[test]
    fn test_validate_all_collects_errors() {
        let mut spec = spec();
        spec.agents.push(agent("a2"));
        spec.agents[0].tools.push("missing_tool".into());
        spec.handoffs = vec![HandoffRule::new("a2", "a2")];

        let result = SpecValidator::validate_all(&spec, Path::new("/nonexistent"));
        assert!(!result.valid);
        // prompts, tools, handoffs, guardrail defaults
        assert_eq!(result.errors.len(), 4, "{:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("description")));
    }
}
