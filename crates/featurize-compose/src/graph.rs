//! Dependency graph analysis using `petgraph`.
//!
//! The resolver tolerates cycles; this graph is built afterwards from a
//! resolution to report them and to check the produced order.

use std::collections::HashMap;

use featurize_common::types::Resolution;
use petgraph::graph::NodeIndex;

/// A dependency graph of features.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of a resolution.
    ///
    /// Dependencies on names outside the resolution are ignored.
    #[must_use]
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut graph = Self::new();
        for name in &resolution.order {
            let _ = graph.add_feature(name);
        }
        for feature in resolution.ordered_features() {
            for dep in feature.dependencies() {
                if resolution.features.contains_key(dep) {
                    graph.add_dependency(feature.name(), dep);
                }
            }
        }
        graph
    }

    /// Adds a feature node, returning the existing one for a known name.
    pub fn add_feature(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        let _ = self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.add_feature(dependency);
        let to = self.add_feature(dependent);
        let _ = self.graph.update_edge(from, to, ());
    }

    /// Number of features in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` for a graph without features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns every dependency cycle as a sorted list of feature names.
    ///
    /// A self-dependency is a cycle of one. Cycles are sorted by their first
    /// name.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|scc| {
                let mut names: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Returns the `(dependent, dependency)` pairs that `order` lists the
    /// wrong way round.
    ///
    /// Only cycles can force such pairs; an acyclic resolution has none.
    #[must_use]
    pub fn order_violations(&self, order: &[String]) -> Vec<(String, String)> {
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let mut violations = Vec::new();
        for edge in self.graph.raw_edges() {
            let (Some(dependency), Some(dependent)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) else {
                continue;
            };
            let misplaced = match (
                position.get(dependency.as_str()),
                position.get(dependent.as_str()),
            ) {
                (Some(dep_pos), Some(pos)) => dep_pos >= pos && dependency != dependent,
                _ => false,
            };
            if misplaced {
                violations.push((dependent.clone(), dependency.clone()));
            }
        }
        violations.sort();
        violations
    }
}

#[cfg(test)]
mod tests {
    use featurize_common::types::{Feature, FeatureMeta};

    use super::*;

    fn resolution(features: &[(&str, &[&str])]) -> Resolution {
        let mut resolution = Resolution::default();
        for (name, deps) in features {
            resolution.order.push((*name).to_string());
            let _ = resolution.features.insert(
                (*name).to_string(),
                Feature::new(FeatureMeta::new(*name, deps.iter().copied()), "", ""),
            );
        }
        resolution
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.cycles().is_empty());
        assert!(graph.order_violations(&[]).is_empty());
    }

    #[test]
    fn add_feature_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_feature("a");
        assert_eq!(graph.add_feature("a"), a);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn diamond_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "c");
        graph.add_dependency("b", "d");
        graph.add_dependency("c", "d");

        assert_eq!(graph.len(), 4);
        assert!(graph.cycles().is_empty());
        let order: Vec<String> = ["d", "c", "b", "a"].map(String::from).to_vec();
        assert!(graph.order_violations(&order).is_empty());
        let reversed: Vec<String> = order.iter().rev().cloned().collect();
        assert_eq!(graph.order_violations(&reversed).len(), 4);
    }

    #[test]
    fn cycle_detection() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");
        graph.add_dependency("c", "a");

        assert_eq!(graph.cycles(), vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = DependencyGraph::from_resolution(&resolution(&[("a", &["a"]), ("b", &[])]));
        assert_eq!(graph.cycles(), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn from_resolution_ignores_outside_names() {
        let graph = DependencyGraph::from_resolution(&resolution(&[("b", &[]), ("a", &["b", "zzz"])]));
        assert_eq!(graph.len(), 2);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn order_violations_only_on_cycles() {
        let acyclic = resolution(&[("c", &[]), ("a", &["c"]), ("b", &["c"])]);
        let graph = DependencyGraph::from_resolution(&acyclic);
        assert!(graph.order_violations(&acyclic.order).is_empty());

        let cyclic = resolution(&[("b", &["a"]), ("a", &["b"])]);
        let graph = DependencyGraph::from_resolution(&cyclic);
        assert_eq!(
            graph.order_violations(&cyclic.order),
            vec![("b".to_string(), "a".to_string())]
        );
    }
}
