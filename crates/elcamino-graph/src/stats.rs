//! Registry statistics.

use std::collections::HashMap;

use elcamino_core::Commands;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::types::{EdgeKind, NodeKind, RegistryGraph};

// ============================================================================
// Types
// ============================================================================

/// Statistics about a registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Registered dependency producers.
    pub dependencies: usize,
    /// Registered commands.
    pub commands: usize,
    /// Names referenced but not registered.
    pub missing: usize,
    /// Dependency → required dependency edges.
    pub required_edges: usize,
    /// Dependency → optional dependency edges.
    pub optional_edges: usize,
    /// Command → dependency edges.
    pub command_edges: usize,
    /// Longest chain of required edges, counted in nodes.
    /// `None` when required edges form a cycle.
    pub max_depth: Option<usize>,
    /// Dependency required by the most producers and commands.
    pub most_required: Option<String>,
}

// ============================================================================
// Functions
// ============================================================================

/// Compute statistics for everything registered on `commands`.
pub fn compute_stats(commands: &Commands) -> GraphStats {
    compute_graph_stats(&RegistryGraph::from_commands(commands))
}

/// Compute statistics for a built [`RegistryGraph`].
pub fn compute_graph_stats(graph: &RegistryGraph) -> GraphStats {
    let count = |kind: NodeKind| graph.nodes_of(kind).count();
    let mut edge_counts: HashMap<EdgeKind, usize> = HashMap::new();
    for (_, _, kind) in graph.iter_edges() {
        *edge_counts.entry(kind).or_insert(0) += 1;
    }
    let edges = |kind: EdgeKind| edge_counts.get(&kind).copied().unwrap_or(0);

    GraphStats {
        dependencies: count(NodeKind::Dependency),
        commands: count(NodeKind::Command),
        missing: count(NodeKind::Missing),
        required_edges: edges(EdgeKind::Required),
        optional_edges: edges(EdgeKind::Optional),
        command_edges: edges(EdgeKind::CommandRequires),
        max_depth: max_required_depth(graph),
        most_required: most_required(graph),
    }
}

fn max_required_depth(graph: &RegistryGraph) -> Option<usize> {
    let required = graph
        .graph
        .filter_map(|_, node| Some(node.clone()), |_, &kind| {
            (kind == EdgeKind::Required).then_some(())
        });
    let sorted = toposort(&required, None).ok()?;

    // Walk dependents before dependencies so each node sees its longest
    // incoming chain.
    let mut depth = vec![1usize; required.node_count()];
    for idx in sorted {
        for edge in required.edges_directed(idx, Direction::Outgoing) {
            let next = depth[idx.index()] + 1;
            let target = edge.target().index();
            depth[target] = depth[target].max(next);
        }
    }
    Some(depth.into_iter().max().unwrap_or(0))
}

fn most_required(graph: &RegistryGraph) -> Option<String> {
    graph
        .graph
        .node_indices()
        .filter(|&idx| graph.graph[idx].kind == NodeKind::Dependency)
        .map(|idx| (graph.requesters(idx).len(), &graph.graph[idx].name))
        .filter(|(count, _)| *count > 0)
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, name)| name.clone())
}

// ============================================================================
// Tests
// ============================================================================
