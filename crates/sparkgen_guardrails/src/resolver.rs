//! Layered guardrail resolution.
//!
//! Guardrails come from three layers: the project defaults file, the workflow's
//! own `guardrails` section, and per-agent selections and overrides. The
//! resolver merges the first two into one configuration and then resolves the
//! effective, ordered rule list for each agent.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GuardrailError, GuardrailResult};
use crate::rules::{AgentGuardrailConfig, GuardrailConfig, GuardrailRule, GuardrailSet, Layer};

/// A rule together with the layer it was taken from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRule {
    pub layer: Layer,
    #[serde(flatten)]
    pub rule: GuardrailRule,
}

impl ResolvedRule {
    /// Ordering key: priority, then severity rank, then layer rank.
    fn sort_key(&self) -> (i64, u8, u8) {
        (self.rule.priority, self.rule.severity.rank(), self.layer.rank())
    }

    /// Whether `candidate` should replace `self` for the same rule name.
    fn is_superseded_by(&self, candidate: &ResolvedRule) -> bool {
        if candidate.rule.priority != self.rule.priority {
            return candidate.rule.priority < self.rule.priority;
        }
        let (current_rank, candidate_rank) = (self.rule.severity.rank(), candidate.rule.severity.rank());
        if candidate_rank != current_rank {
            return candidate_rank < current_rank;
        }
        candidate.layer.rank() < self.layer.rank()
    }
}

/// Defaults and workflow configuration merged into one view.
#[derive(Debug, Clone)]
pub struct MergedGuardrails {
    pub config: GuardrailConfig,
    set_layers: HashMap<String, Layer>,
}

impl MergedGuardrails {
    /// Layer a set belongs to; any name the defaults file defines stays a default set.
    pub fn layer_of(&self, set_name: &str) -> Layer {
        self.set_layers.get(set_name).copied().unwrap_or(Layer::Workflow)
    }

    pub fn set(&self, name: &str) -> Option<&GuardrailSet> {
        self.config.sets.iter().find(|s| s.name == name)
    }

    /// Names of sets the defaults file defines, including ones the workflow redefines.
    pub fn default_set_names(&self) -> BTreeSet<String> {
        self.set_layers
            .iter()
            .filter(|(_, layer)| **layer == Layer::Default)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Resolver for guardrail configuration rooted at a project directory.
pub struct GuardrailResolver {
    base_dir: PathBuf,
}

impl GuardrailResolver {
    /// Create a resolver; relative paths are resolved against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Load the defaults file and return it with the names of the sets it defines.
    pub fn load_defaults(&self, defaults_path: &str) -> GuardrailResult<(GuardrailConfig, BTreeSet<String>)> {
        let path = self.base_dir.join(defaults_path);
        if !path.exists() {
            return Err(GuardrailError::DefaultsNotFound(defaults_path.to_string()));
        }

        debug!("Loading guardrail defaults from {:?}", path);
        let content = fs::read_to_string(&path)?;
        let config = GuardrailConfig::from_yaml(&content)?;
        let names = config.sets.iter().map(|s| s.name.clone()).collect();
        Ok((config, names))
    }

    /// Merge the defaults file with the workflow's guardrail section.
    pub fn merge_configs(&self, defaults: &GuardrailConfig, workflow: &GuardrailConfig) -> MergedGuardrails {
        let mut sets: Vec<GuardrailSet> = defaults.sets.clone();
        let mut set_layers: HashMap<String, Layer> = defaults
            .sets
            .iter()
            .map(|s| (s.name.clone(), Layer::Default))
            .collect();

        for candidate in &workflow.sets {
            match sets.iter_mut().find(|s| s.name == candidate.name) {
                Some(existing) => *existing = candidate.clone(),
                None => sets.push(candidate.clone()),
            }
            set_layers.entry(candidate.name.clone()).or_insert(Layer::Workflow);
        }

        let mut seen = HashSet::new();
        let allowed_categories = defaults
            .allowed_categories
            .iter()
            .chain(workflow.allowed_categories.iter())
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect();

        let apply_sets = if workflow.apply_sets.is_empty() {
            defaults.apply_sets.clone()
        } else {
            workflow.apply_sets.clone()
        };

        let defaults_path = if workflow.defaults_path.is_empty() {
            defaults.defaults_path.clone()
        } else {
            workflow.defaults_path.clone()
        };

        let config = GuardrailConfig {
            defaults_path,
            documentation: non_empty(&workflow.documentation).or_else(|| non_empty(&defaults.documentation)),
            workflow_doc: non_empty(&workflow.workflow_doc).or_else(|| non_empty(&defaults.workflow_doc)),
            apply_sets,
            allowed_categories,
            sets,
        };

        MergedGuardrails { config, set_layers }
    }

    /// Resolve the effective rule list for one agent.
    pub fn resolve_agent_rules(
        &self,
        merged: &MergedGuardrails,
        agent: &AgentGuardrailConfig,
    ) -> GuardrailResult<Vec<ResolvedRule>> {
        let missing: BTreeSet<&str> = merged
            .config
            .apply_sets
            .iter()
            .chain(agent.use_sets.iter())
            .filter(|name| merged.set(name).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(GuardrailError::UnknownSets(join(missing)));
        }

        let mut resolved: Vec<ResolvedRule> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let mut add_rules = |rules: &[GuardrailRule], layer: Layer| {
            for rule in rules {
                let candidate = ResolvedRule {
                    layer,
                    rule: rule.clone(),
                };
                match index.get(&rule.name) {
                    Some(&slot) => {
                        if resolved[slot].is_superseded_by(&candidate) {
                            resolved[slot] = candidate;
                        }
                    }
                    None => {
                        index.insert(rule.name.clone(), resolved.len());
                        resolved.push(candidate);
                    }
                }
            }
        };

        for set_name in merged.config.apply_sets.iter().chain(agent.use_sets.iter()) {
            if let Some(set) = merged.set(set_name) {
                add_rules(&set.rules, merged.layer_of(set_name));
            }
        }
        add_rules(&agent.overrides, Layer::Agent);

        if merged.config.allowed_categories.is_empty() {
            return Err(GuardrailError::ValidationFailed(
                "Guardrail config must declare allowed_categories to validate rule categories.".to_string(),
            ));
        }
        let allowed: HashSet<&str> = merged.config.allowed_categories.iter().map(String::as_str).collect();
        for entry in &resolved {
            let unknown: BTreeSet<&str> = entry
                .rule
                .categories
                .iter()
                .map(String::as_str)
                .filter(|c| !allowed.contains(c))
                .collect();
            if !unknown.is_empty() {
                return Err(GuardrailError::ValidationFailed(format!(
                    "Guardrail rule '{}' uses invalid categories: {}",
                    entry.rule.name,
                    join(unknown)
                )));
            }
        }

        // sort_by_key is stable, so equal keys keep first-seen order
        resolved.sort_by_key(ResolvedRule::sort_key);
        info!("Resolved {} guardrail rule(s)", resolved.len());
        Ok(resolved)
    }

    /// Check that every referenced documentation file exists.
    pub fn validate_docs(&self, merged: &MergedGuardrails, agents: &[&AgentGuardrailConfig]) -> GuardrailResult<()> {
        let doc_paths = [&merged.config.documentation, &merged.config.workflow_doc]
            .into_iter()
            .chain(merged.config.sets.iter().map(|s| &s.docs))
            .chain(agents.iter().map(|a| &a.doc))
            .filter_map(|p| non_empty(p));

        let missing: BTreeSet<String> = doc_paths.filter(|p| !self.base_dir.join(p).exists()).collect();
        if !missing.is_empty() {
            return Err(GuardrailError::ValidationFailed(format!(
                "Guardrail documentation file(s) missing: {}",
                join(missing.iter().map(String::as_str))
            )));
        }
        Ok(())
    }

    /// Pretty JSON dump of resolved rules.
    pub fn serialize_rules_for_debug(rules: &[ResolvedRule]) -> GuardrailResult<String> {
        Ok(serde_json::to_string_pretty(rules)?)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn join<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items.into_iter().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Mode, Severity};
    use std::fs;
    use tempfile::tempdir;

    fn config_with(sets: Vec<GuardrailSet>, apply: &[&str]) -> GuardrailConfig {
        GuardrailConfig {
            apply_sets: apply.iter().map(|s| s.to_string()).collect(),
            allowed_categories: vec!["safety".into(), "privacy".into()],
            sets,
            ..Default::default()
        }
    }

    fn set_of(name: &str, rules: Vec<GuardrailRule>) -> GuardrailSet {
        GuardrailSet {
            name: name.into(),
            rules,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_workflow_replaces_default_set() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![
                set_of("baseline", vec![GuardrailRule::new("a", "safety")]),
                set_of("pii", vec![]),
            ],
            &["baseline"],
        );
        let mut workflow = config_with(vec![set_of("baseline", vec![]), set_of("extra", vec![])], &[]);
        workflow.allowed_categories = vec!["privacy".into(), "finance".into()];

        let merged = resolver.merge_configs(&defaults, &workflow);
        assert_eq!(merged.config.set_names(), vec!["baseline", "pii", "extra"]);
        assert!(merged.set("baseline").unwrap().rules.is_empty());
        assert_eq!(merged.config.apply_sets, vec!["baseline".to_string()]);
        assert_eq!(merged.config.allowed_categories, vec!["safety", "privacy", "finance"]);
        assert_eq!(merged.layer_of("baseline"), Layer::Default);
        assert_eq!(merged.layer_of("pii"), Layer::Default);
        assert_eq!(merged.layer_of("extra"), Layer::Workflow);
        assert_eq!(
            merged.default_set_names().into_iter().collect::<Vec<_>>(),
            vec!["baseline".to_string(), "pii".to_string()]
        );
    }

    #[test]
    fn test_redefined_default_set_keeps_default_layer_in_tie_break() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![
                set_of("default_only", vec![GuardrailRule::new("x", "safety").with_mode(Mode::Block)]),
                set_of("baseline", vec![GuardrailRule::new("x", "safety").with_mode(Mode::Warn)]),
            ],
            &["default_only", "baseline"],
        );
        let workflow = config_with(
            vec![set_of("baseline", vec![GuardrailRule::new("x", "safety").with_mode(Mode::Allow)])],
            &[],
        );

        let merged = resolver.merge_configs(&defaults, &workflow);
        let rules = resolver
            .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
            .unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].layer, Layer::Default);
        assert_eq!(rules[0].rule.mode, Mode::Block);
    }

    #[test]
    fn test_lower_priority_wins() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![set_of("baseline", vec![GuardrailRule::new("dup", "safety").with_priority(5)])],
            &["baseline"],
        );
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let agent = AgentGuardrailConfig {
            overrides: vec![GuardrailRule::new("dup", "safety").with_priority(10).with_mode(Mode::Block)],
            ..Default::default()
        };

        let rules = resolver.resolve_agent_rules(&merged, &agent).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].layer, Layer::Default);
        assert_eq!(rules[0].rule.priority, 5);
    }

    #[test]
    fn test_severity_then_layer_tie_break() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![set_of(
                "baseline",
                vec![
                    GuardrailRule::new("sev", "safety").with_severity(Severity::Low),
                    GuardrailRule::new("layer", "safety"),
                ],
            )],
            &["baseline"],
        );
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let agent = AgentGuardrailConfig {
            overrides: vec![
                GuardrailRule::new("sev", "safety").with_severity(Severity::High),
                GuardrailRule::new("layer", "safety").with_mode(Mode::Block),
            ],
            ..Default::default()
        };

        let rules = resolver.resolve_agent_rules(&merged, &agent).unwrap();
        let sev = rules.iter().find(|r| r.rule.name == "sev").unwrap();
        assert_eq!(sev.rule.severity, Severity::High);
        let layer = rules.iter().find(|r| r.rule.name == "layer").unwrap();
        assert_eq!(layer.layer, Layer::Agent);
        assert_eq!(layer.rule.mode, Mode::Block);
    }

    #[test]
    fn test_equal_candidates_keep_first() {
        let resolver = GuardrailResolver::new(".");
        let first = GuardrailRule::new("same", "safety").with_mode(Mode::Block);
        let second = GuardrailRule::new("same", "safety").with_mode(Mode::Warn);
        let defaults = config_with(
            vec![set_of("one", vec![first]), set_of("two", vec![second])],
            &["one", "two"],
        );
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let rules = resolver
            .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
            .unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule.mode, Mode::Block);
    }

    #[test]
    fn test_sorted_by_priority_then_severity() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![set_of(
                "baseline",
                vec![
                    GuardrailRule::new("late", "safety").with_priority(50),
                    GuardrailRule::new("low", "safety").with_priority(1).with_severity(Severity::Low),
                    GuardrailRule::new("crit", "safety").with_priority(1).with_severity(Severity::Critical),
                ],
            )],
            &["baseline"],
        );
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let rules = resolver
            .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
            .unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.rule.name.as_str()).collect();
        assert_eq!(names, vec!["crit", "low", "late"]);
    }

    #[test]
    fn test_unknown_sets_reported_sorted() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(vec![], &["zeta"]);
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let agent = AgentGuardrailConfig {
            use_sets: vec!["alpha".into()],
            ..Default::default()
        };
        match resolver.resolve_agent_rules(&merged, &agent) {
            Err(GuardrailError::UnknownSets(names)) => assert_eq!(names, "alpha, zeta"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_category_rejected() {
        let resolver = GuardrailResolver::new(".");
        let defaults = config_with(
            vec![set_of("baseline", vec![GuardrailRule::new("r", "finance")])],
            &["baseline"],
        );
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        let err = resolver
            .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid categories: finance"));
    }

    #[test]
    fn test_allowed_categories_required() {
        let resolver = GuardrailResolver::new(".");
        let mut defaults = config_with(vec![], &[]);
        defaults.allowed_categories.clear();
        let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
        assert!(resolver
            .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
            .is_err());
    }

    #[test]
    fn test_validate_docs_lists_missing() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("README.md"), "docs").unwrap();
        let resolver = GuardrailResolver::new(temp.path());
        let mut workflow = config_with(vec![], &[]);
        workflow.documentation = Some("README.md".into());
        workflow.workflow_doc = Some("missing.md".into());
        let merged = resolver.merge_configs(&GuardrailConfig::default(), &workflow);
        let agent = AgentGuardrailConfig {
            doc: Some("agents/a.md".into()),
            ..Default::default()
        };

        let err = resolver.validate_docs(&merged, &[&agent]).unwrap_err();
        assert!(err.to_string().contains("agents/a.md, missing.md"));
    }

    #[test]
    fn test_load_defaults_missing_file() {
        let temp = tempdir().unwrap();
        let resolver = GuardrailResolver::new(temp.path());
        assert!(matches!(
            resolver.load_defaults("nope.yaml"),
            Err(GuardrailError::DefaultsNotFound(_))
        ));
    }
}
