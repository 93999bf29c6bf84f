//! Registry graph types.
//!
//! [`RegistryGraph`] is a petgraph view of everything registered on a
//! [`Commands`]: one node per dependency producer and per command, one node
//! per name that is referenced but never registered, and one edge per
//! declared requirement. Building it never runs a producer.

use std::collections::HashMap;

use elcamino_core::Commands;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

// ============================================================================
// Nodes and edges
// ============================================================================

/// What a graph node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A registered dependency producer.
    Dependency,
    /// A registered command.
    Command,
    /// A name referenced by some requirement but not registered.
    Missing,
}

/// A node in the registry graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Registered (or referenced) name.
    pub name: String,
    /// Node kind.
    pub kind: NodeKind,
}

/// How one node requires another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Dependency → required dependency.
    Required,
    /// Dependency → optional ("possible") dependency.
    Optional,
    /// Command → required dependency.
    CommandRequires,
}

impl EdgeKind {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            EdgeKind::Required => "required",
            EdgeKind::Optional => "optional",
            EdgeKind::CommandRequires => "command",
        }
    }
}

/// Serializable edge description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Requesting node name.
    pub from: String,
    /// Requested node name.
    pub to: String,
    /// Edge kind.
    pub kind: EdgeKind,
}

/// Serializable snapshot of a [`RegistryGraph`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphExport {
    /// All nodes.
    pub nodes: Vec<GraphNode>,
    /// All edges.
    pub edges: Vec<EdgeInfo>,
}

// ============================================================================
// RegistryGraph
// ============================================================================

/// Directed graph of registered dependencies, commands, and their edges.
///
/// Dependency and command names live in separate registries and may
/// collide, so they are indexed separately.
#[derive(Clone, Debug, Default)]
pub struct RegistryGraph {
    /// The underlying petgraph graph. Edges point from requester to requested.
    pub graph: DiGraph<GraphNode, EdgeKind>,
    dependency_index: HashMap<String, NodeIndex>,
    command_index: HashMap<String, NodeIndex>,
}

impl RegistryGraph {
    /// Build the graph for everything registered on `commands`.
    pub fn from_commands(commands: &Commands) -> Self {
        let dependencies = commands.dependency_registry().collect();
        let command_entries = commands.command_registry().collect();
        let mut graph = Self::default();

        for name in dependencies.keys() {
            graph.add_dependency(name, NodeKind::Dependency);
        }

        for (name, entry) in &dependencies {
            let from = graph.dependency_index[name];
            for dep in &entry.metadata().required {
                let to = graph.dependency_or_missing(dep);
                graph.graph.add_edge(from, to, EdgeKind::Required);
            }
            for dep in &entry.metadata().optional {
                let to = graph.dependency_or_missing(dep);
                graph.graph.add_edge(from, to, EdgeKind::Optional);
            }
        }

        for (name, entry) in &command_entries {
            let from = graph.graph.add_node(GraphNode {
                name: name.clone(),
                kind: NodeKind::Command,
            });
            graph.command_index.insert(name.clone(), from);
            for dep in &entry.metadata().required {
                let to = graph.dependency_or_missing(dep);
                graph.graph.add_edge(from, to, EdgeKind::CommandRequires);
            }
        }

        graph
    }

    fn add_dependency(&mut self, name: &str, kind: NodeKind) -> NodeIndex {
        let idx = self.graph.add_node(GraphNode {
            name: name.to_string(),
            kind,
        });
        self.dependency_index.insert(name.to_string(), idx);
        idx
    }

    fn dependency_or_missing(&mut self, name: &str) -> NodeIndex {
        match self.dependency_index.get(name) {
            Some(&idx) => idx,
            None => self.add_dependency(name, NodeKind::Missing),
        }
    }

    /// Node index of a dependency (or missing) name.
    pub fn dependency(&self, name: &str) -> Option<NodeIndex> {
        self.dependency_index.get(name).copied()
    }

    /// Node index of a command.
    pub fn command(&self, name: &str) -> Option<NodeIndex> {
        self.command_index.get(name).copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all nodes.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Iterate over all nodes of `kind`.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.iter_nodes().filter(move |node| node.kind == kind)
    }

    /// Iterate over all edges as `(from, to, kind)`.
    pub fn iter_edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode, EdgeKind)> {
        self.graph.edge_indices().filter_map(|edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            let kind = *self.graph.edge_weight(edge)?;
            Some((&self.graph[from], &self.graph[to], kind))
        })
    }

    /// Names of the nodes that require `idx`.
    pub fn requesters(&self, idx: NodeIndex) -> Vec<&str> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].name.as_str())
            .collect()
    }

    /// Serializable snapshot.
    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.iter_nodes().cloned().collect(),
            edges: self
                .iter_edges()
                .map(|(from, to, kind)| EdgeInfo {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    kind,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_commands;

    #[test]
    fn test_from_commands_counts() {
        let graph = RegistryGraph::from_commands(&sample_commands());
        // bar, foo, foo_2, ghost (missing), show (command)
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.nodes_of(NodeKind::Dependency).count(), 3);
        assert_eq!(graph.nodes_of(NodeKind::Missing).count(), 1);
        assert_eq!(graph.nodes_of(NodeKind::Command).count(), 1);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_edge_kinds() {
        let graph = RegistryGraph::from_commands(&sample_commands());
        let edges: Vec<(String, String, EdgeKind)> = graph
            .iter_edges()
            .map(|(f, t, k)| (f.name.clone(), t.name.clone(), k))
            .collect();

        assert!(edges.contains(&("foo".into(), "bar".into(), EdgeKind::Required)));
        assert!(edges.contains(&("foo_2".into(), "bar".into(), EdgeKind::Optional)));
        assert!(edges.contains(&("show".into(), "foo".into(), EdgeKind::CommandRequires)));
        assert!(edges.contains(&("show".into(), "ghost".into(), EdgeKind::CommandRequires)));
    }

    #[test]
    fn test_command_and_dependency_may_share_a_name() {
        let commands = Commands::new();
        commands.register_dependency(elcamino_core::DependencySpec::named("same"), |_, _| Ok(())).unwrap();
        commands.register_command(
            elcamino_core::CommandSpec::named("same").requires(["same"]),
            |_, _| Ok(()),
        ).unwrap();

        let graph = RegistryGraph::from_commands(&commands);
        let dep = graph.dependency("same").unwrap();
        let cmd = graph.command("same").unwrap();
        assert_ne!(dep, cmd);
        assert_eq!(graph.requesters(dep), vec!["same"]);
    }

    #[test]
    fn test_export_serializes() {
        let graph = RegistryGraph::from_commands(&sample_commands());
        let export = graph.export();
        assert_eq!(export.nodes.len(), 5);
        assert_eq!(export.edges.len(), 4);

        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains(r#""kind":"command_requires""#));
        assert!(json.contains(r#""kind":"missing""#));
    }

    #[test]
    fn test_empty_commands() {
        let graph = RegistryGraph::from_commands(&Commands::new());
        assert_eq!(graph.node_count(), 0);
        assert!(graph.export().edges.is_empty());
    }
}
