//! Dependency graph construction.
//!
//! This module derives the edge set the planner orders by: implicit edges
//! from cross-resource references (referenced resource → referencing
//! resource) and explicit edges from declared predecessor constraints.
//! Duplicate edges collapse to one logical edge.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::descriptor::DescriptorSet;
use crate::error::{GraphError, ResolveError, Result, SynthError};

/// Directed dependency graph over a descriptor set.
///
/// Nodes are indexed by declaration order; an edge `(from, to)` means
/// "`from` must deploy strictly before `to`".
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Resource ids in declaration order.
    ids: Vec<String>,
    /// Id → declaration index.
    index: IndexMap<String, usize>,
    /// Logical edges, set semantics.
    edges: IndexSet<(usize, usize)>,
    /// Successor lists derived from the edge set.
    successors: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph from a descriptor set.
    ///
    /// Implicit edges come from reference properties, explicit edges from
    /// `depends_on` declarations.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownPredecessor`] if a `depends_on` id is absent
    ///   from the set
    /// - [`ResolveError::UnknownReference`] if a reference target is absent
    ///   (normally caught earlier by the resolver; re-checked here so the
    ///   graph is safe to build standalone)
    pub fn build(set: &DescriptorSet) -> Result<Self> {
        let ids: Vec<String> = set.iter().map(|d| d.id.clone()).collect();
        let index: IndexMap<String, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut edges = IndexSet::new();

        for (to, descriptor) in set.iter().enumerate() {
            // Implicit edges: referenced resource deploys first.
            for (target, _attribute) in descriptor.references() {
                let Some(&from) = index.get(target) else {
                    return Err(SynthError::Resolve(ResolveError::UnknownReference {
                        id: descriptor.id.clone(),
                        target: target.to_string(),
                    }));
                };
                edges.insert((from, to));
            }

            // Explicit edges: declared predecessors deploy first.
            for predecessor in &descriptor.depends_on {
                let Some(&from) = index.get(predecessor.as_str()) else {
                    return Err(SynthError::Graph(GraphError::UnknownPredecessor {
                        id: descriptor.id.clone(),
                        predecessor: predecessor.clone(),
                    }));
                };
                edges.insert((from, to));
            }
        }

        let mut successors = vec![Vec::new(); ids.len()];
        for &(from, to) in &edges {
            successors[from].push(to);
        }

        debug!(
            "Built dependency graph: {} nodes, {} edges",
            ids.len(),
            edges.len()
        );

        Ok(Self {
            ids,
            index,
            edges,
            successors,
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns the number of logical edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the id at the given declaration index.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Returns the declaration index of an id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the successor indices of a node.
    #[must_use]
    pub fn successors(&self, index: usize) -> &[usize] {
        self.successors
            .get(index)
            .map_or(&[], Vec::as_slice)
    }

    /// Iterates over edges as id pairs, in derivation order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .map(|&(from, to)| (self.ids[from].as_str(), self.ids[to].as_str()))
    }

    /// Computes the in-degree of every node.
    #[must_use]
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.ids.len()];
        for &(_, to) in &self.edges {
            degrees[to] += 1;
        }
        degrees
    }

    /// Returns true if the graph contains a directed path from `from` to
    /// `to`.
    ///
    /// Used only for diagnostics on cycle errors; planning itself never
    /// queries paths.
    #[must_use]
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let (Some(start), Some(goal)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };

        let mut visited = vec![false; self.ids.len()];
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if current == goal && current != start {
                return true;
            }
            for &next in self.successors(current) {
                if next == goal {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{PropertyValue, ResourceDescriptor};

    fn sample_set() -> DescriptorSet {
        DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
            ResourceDescriptor::new("api", "rest-api").with_predecessor("handler"),
        ])
        .unwrap()
    }

    #[test]
    fn test_implicit_and_explicit_edges() {
        let graph = DependencyGraph::build(&sample_set()).unwrap();
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, [("users-table", "handler"), ("handler", "api")]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        // Reference and explicit predecessor both point at the table.
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name"))
                .with_predecessor("users-table"),
        ])
        .unwrap();

        let graph = DependencyGraph::build(&set).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.in_degrees(), [0, 1]);
    }

    #[test]
    fn test_unknown_predecessor_rejected() {
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("api", "rest-api").with_predecessor("ghost"),
        ])
        .unwrap();

        let err = DependencyGraph::build(&set).unwrap_err();
        assert!(matches!(
            err,
            SynthError::Graph(GraphError::UnknownPredecessor { ref predecessor, .. })
                if predecessor == "ghost"
        ));
    }

    #[test]
    fn test_has_path_transitive() {
        let graph = DependencyGraph::build(&sample_set()).unwrap();
        assert!(graph.has_path("users-table", "api"));
        assert!(!graph.has_path("api", "users-table"));
        assert!(!graph.has_path("users-table", "ghost"));
    }

    #[test]
    fn test_in_degrees() {
        let graph = DependencyGraph::build(&sample_set()).unwrap();
        assert_eq!(graph.in_degrees(), [0, 1, 1]);
    }
}
