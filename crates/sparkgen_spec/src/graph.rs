//! Agent handoff graph.
//!
//! Handoffs form a directed graph over agent names. A workflow is only valid
//! when that graph is acyclic, since a run follows handoffs until none apply.

use std::collections::{HashMap, HashSet};

use crate::error::{SpecError, SpecResult};
use crate::models::{HandoffRule, WorkflowSpec};

/// Directed graph of agent handoffs.
#[derive(Debug, Clone, Default)]
pub struct HandoffGraph {
    /// Source nodes in first-seen order
    nodes: Vec<String>,
    adjacency: HashMap<String, Vec<String>>,
    handoffs: Vec<HandoffRule>,
}

impl HandoffGraph {
    /// Build the graph, rejecting handoffs that reference unknown agents.
    pub fn from_spec(spec: &WorkflowSpec) -> SpecResult<Self> {
        let agents: HashSet<&str> = spec.agents.iter().map(|a| a.name.as_str()).collect();
        let mut graph = Self::default();

        for handoff in &spec.handoffs {
            if !agents.contains(handoff.source.as_str()) || !agents.contains(handoff.target.as_str()) {
                return Err(SpecError::validation(format!(
                    "Handoff references unknown agents: {} -> {}",
                    handoff.source, handoff.target
                )));
            }
            graph.add(handoff.clone());
        }

        Ok(graph)
    }

    pub fn add(&mut self, handoff: HandoffRule) {
        if !self.adjacency.contains_key(&handoff.source) {
            self.nodes.push(handoff.source.clone());
        }
        self.adjacency
            .entry(handoff.source.clone())
            .or_default()
            .push(handoff.target.clone());
        self.handoffs.push(handoff);
    }

    pub fn targets(&self, source: &str) -> &[String] {
        self.adjacency.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a cycle, returned as the path from the first repeated node back to itself.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for node in &self.nodes {
            if visited.contains(node.as_str()) {
                continue;
            }
            if let Some(cycle) = self.visit(node, &mut visited, &mut stack) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        stack.push(node);

        for neighbor in self.targets(node) {
            if let Some(pos) = stack.iter().position(|n| *n == neighbor.as_str()) {
                let mut cycle: Vec<String> = stack[pos..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.clone());
                return Some(cycle);
            }
            if !visited.contains(neighbor.as_str()) {
                if let Some(cycle) = self.visit(neighbor, visited, stack) {
                    return Some(cycle);
                }
            }
        }

        stack.pop();
        None
    }

    /// Fail with a validation error if any handoff cycle exists.
    pub fn ensure_acyclic(&self) -> SpecResult<()> {
        match self.find_cycle() {
            Some(cycle) => Err(SpecError::validation(format!(
                "Circular agent handoff detected in workflow: {}",
                cycle.join(" -> ")
            ))),
            None => Ok(()),
        }
    }

    /// Agents a run visits starting at `entry`.
    ///
    /// Handoffs are scanned once in declaration order; an automatic handoff
    /// from the currently active agent to an unvisited target moves the run on.
    pub fn execution_chain(&self, entry: &str) -> Vec<String> {
        let mut active = entry.to_string();
        let mut chain = vec![active.clone()];

        for handoff in &self.handoffs {
            if handoff.source != active || !handoff.is_automatic() {
                continue;
            }
            if chain.contains(&handoff.target) {
                continue;
            }
            active = handoff.target.clone();
            chain.push(active.clone());
        }

        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> HandoffGraph {
        let mut graph = HandoffGraph::default();
        for (s, t) in edges {
            graph.add(HandoffRule::new(*s, *t));
        }
        graph
    }

    #[test]
    fn test_acyclic() {
        let g = graph(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(g.find_cycle().is_none());
        assert!(g.ensure_acyclic().is_ok());
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[("a1", "a2"), ("a2", "a1")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["a1", "a2", "a1"]);
        let err = g.ensure_acyclic().unwrap_err();
        assert!(err.to_string().contains("a1 -> a2 -> a1"));
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", "a")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_cycle_deeper_in_graph() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "b")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["b", "c", "d", "b"]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let g = graph(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        assert!(g.find_cycle().is_none());
    }

    #[test]
    fn test_execution_chain() {
        let mut g = graph(&[("triage", "billing"), ("billing", "summary")]);
        let mut manual = HandoffRule::new("summary", "escalation");
        manual.trigger = "on_request".into();
        g.add(manual);

        assert_eq!(g.execution_chain("triage"), vec!["triage", "billing", "summary"]);
        assert_eq!(g.execution_chain("billing"), vec!["billing", "summary"]);
    }

    #[test]
    fn test_execution_chain_single_pass() {
        // the second edge is declared before its source becomes active
        let g = graph(&[("b", "c"), ("a", "b")]);
        assert_eq!(g.execution_chain("a"), vec!["a", "b"]);
    }
}
