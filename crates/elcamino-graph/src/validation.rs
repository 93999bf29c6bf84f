//! Registry validation and integrity checking.
//!
//! Finds problems that `mkgraph` or `run` would only report at run time:
//! requirements on unregistered names and circular requirements. Also
//! reports optional-only cycles and producers nobody refers to.

use std::collections::{BTreeSet, HashMap};

use elcamino_core::Commands;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::types::{EdgeKind, NodeKind, RegistryGraph};

// ============================================================================
// Types
// ============================================================================

/// Result of registry validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the registry is valid (no errors).
    pub valid: bool,
    /// Problems that will make resolution fail.
    pub errors: Vec<ValidationIssue>,
    /// Problems that fail only on some paths.
    pub warnings: Vec<ValidationIssue>,
    /// Informational findings.
    pub info: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Add an error (marks the registry as invalid).
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    /// Add a warning.
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Add an informational finding.
    pub fn add_info(&mut self, issue: ValidationIssue) {
        self.info.push(issue);
    }

    /// Total issue count (errors + warnings).
    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// First issue with `code` in any category.
    pub fn find(&self, code: &str) -> Option<&ValidationIssue> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .chain(&self.info)
            .find(|issue| issue.code == code)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// A validation issue found in the registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Affected names.
    pub nodes: Vec<String>,
    /// Affected edges, as `from -> to`.
    pub edges: Vec<String>,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Attach affected nodes.
    pub fn with_nodes(mut self, nodes: Vec<String>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Attach affected edges.
    pub fn with_edges(mut self, edges: Vec<String>) -> Self {
        self.edges = edges;
        self
    }
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate everything registered on `commands`.
///
/// Checks for:
/// - Requirements on unregistered names (error, or warning when only
///   optional edges point at them)
/// - Cycles through required edges (error)
/// - Cycles that need an optional edge (warning)
/// - Dependencies nothing refers to (info)
pub fn validate(commands: &Commands) -> ValidationResult {
    validate_graph(&RegistryGraph::from_commands(commands))
}

/// Validate an already built [`RegistryGraph`].
pub fn validate_graph(graph: &RegistryGraph) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_missing(graph, &mut result);
    check_cycles(graph, &mut result);
    check_unused(graph, &mut result);

    log::debug!(
        "validated registry graph: {} error(s), {} warning(s), {} info",
        result.errors.len(),
        result.warnings.len(),
        result.info.len()
    );
    result
}

/// Quick check if the registry has any validation errors.
pub fn is_valid(commands: &Commands) -> bool {
    validate(commands).valid
}

// ============================================================================
// Individual checks
// ============================================================================

fn check_missing(graph: &RegistryGraph, result: &mut ValidationResult) {
    let mut missing = Vec::new();
    let mut missing_edges = Vec::new();
    let mut optional = Vec::new();
    let mut optional_edges = Vec::new();

    for idx in graph.graph.node_indices() {
        let node = &graph.graph[idx];
        if node.kind != NodeKind::Missing {
            continue;
        }
        let incoming: Vec<(String, EdgeKind)> = graph
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (graph.graph[edge.source()].name.clone(), *edge.weight()))
            .collect();
        let edges = incoming
            .iter()
            .map(|(requester, _)| format!("{requester} -> {}", node.name));

        if incoming.iter().all(|(_, kind)| *kind == EdgeKind::Optional) {
            optional.push(node.name.clone());
            optional_edges.extend(edges);
        } else {
            missing.push(node.name.clone());
            missing_edges.extend(edges);
        }
    }

    if !missing.is_empty() {
        result.add_error(
            ValidationIssue::new(
                "MISSING_DEPENDENCY",
                format!("{} required name(s) are not registered", missing.len()),
            )
            .with_nodes(missing)
            .with_edges(missing_edges),
        );
    }

    if !optional.is_empty() {
        result.add_warning(
            ValidationIssue::new(
                "MISSING_OPTIONAL",
                format!(
                    "{} optional name(s) are not registered and fail if built",
                    optional.len()
                ),
            )
            .with_nodes(optional)
            .with_edges(optional_edges),
        );
    }
}

fn check_cycles(graph: &RegistryGraph, result: &mut ValidationResult) {
    let required = cycles(graph, |kind| kind == EdgeKind::Required);
    for cycle in &required {
        result.add_error(
            ValidationIssue::new(
                "REQUIRED_CYCLE",
                format!("Circular required dependencies among {} name(s)", cycle.len()),
            )
            .with_nodes(cycle.iter().cloned().collect()),
        );
    }

    let any = cycles(graph, |kind| {
        matches!(kind, EdgeKind::Required | EdgeKind::Optional)
    });
    for cycle in any {
        if required.contains(&cycle) {
            continue;
        }
        result.add_warning(
            ValidationIssue::new(
                "OPTIONAL_CYCLE",
                "Cycle through optional dependencies fails if its builder is invoked",
            )
            .with_nodes(cycle.into_iter().collect()),
        );
    }
}

/// Strongly connected components that form cycles over the selected edges.
fn cycles(graph: &RegistryGraph, keep: impl Fn(EdgeKind) -> bool) -> Vec<BTreeSet<String>> {
    let mut sub: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for idx in graph.graph.node_indices() {
        let node = &graph.graph[idx];
        if node.kind == NodeKind::Dependency {
            indices.insert(idx, sub.add_node(node.name.clone()));
        }
    }

    for edge in graph.graph.edge_indices() {
        let (Some((from, to)), Some(&kind)) =
            (graph.graph.edge_endpoints(edge), graph.graph.edge_weight(edge))
        else {
            continue;
        };
        if !keep(kind) {
            continue;
        }
        if let (Some(&from), Some(&to)) = (indices.get(&from), indices.get(&to)) {
            sub.add_edge(from, to, ());
        }
    }

    tarjan_scc(&sub)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || sub.contains_edge(component[0], component[0])
        })
        .map(|component| component.into_iter().map(|idx| sub[idx].clone()).collect())
        .collect()
}

fn check_unused(graph: &RegistryGraph, result: &mut ValidationResult) {
    let unused: Vec<String> = graph
        .graph
        .node_indices()
        .filter(|&idx| graph.graph[idx].kind == NodeKind::Dependency)
        .filter(|&idx| graph.requesters(idx).is_empty())
        .map(|idx| graph.graph[idx].name.clone())
        .collect();

    if !unused.is_empty() {
        result.add_info(
            ValidationIssue::new(
                "UNUSED_DEPENDENCY",
                format!("{} dependency(ies) are not required by anything", unused.len()),
            )
            .with_nodes(unused),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_commands;
    use elcamino_core::{CommandSpec, DependencySpec};

    fn commands_with(specs: Vec<DependencySpec>) -> Commands {
        let commands = Commands::new();
        for spec in specs {
            commands.register_dependency(spec, |_, _| Ok(())).unwrap();
        }
        commands
    }

    // ------------------------------------------------------------------------
    // Full validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_validate_empty() {
        let result = validate(&Commands::new());
        assert!(result.valid);
        assert_eq!(result.total_issues(), 0);
        assert!(result.info.is_empty());
    }

    #[test]
    fn test_validate_clean_registry() {
        let commands = commands_with(vec![
            DependencySpec::named("a").requires(["b"]),
            DependencySpec::named("b"),
        ]);
        commands.register_command(CommandSpec::named("go").requires(["a"]), |_, _| Ok(())).unwrap();

        let result = validate(&commands);
        assert!(result.valid);
        assert_eq!(result.total_issues(), 0);
        assert!(is_valid(&commands));
    }

    // ------------------------------------------------------------------------
    // Missing references
    // ------------------------------------------------------------------------

    #[test]
    fn test_missing_dependency() {
        let result = validate(&sample_commands());
        assert!(!result.valid);

        let issue = result.find("MISSING_DEPENDENCY").unwrap();
        assert_eq!(issue.nodes, vec!["ghost"]);
        assert_eq!(issue.edges, vec!["show -> ghost"]);
    }

    #[test]
    fn test_missing_optional_is_warning() {
        let commands = commands_with(vec![DependencySpec::named("a").possibly(["nope"])]);
        let result = validate(&commands);
        assert!(result.valid);
        assert!(result.find("MISSING_DEPENDENCY").is_none());
        assert_eq!(result.find("MISSING_OPTIONAL").unwrap().edges, vec!["a -> nope"]);
    }

    #[test]
    fn test_missing_both_ways_is_error() {
        let commands = commands_with(vec![
            DependencySpec::named("a").possibly(["nope"]),
            DependencySpec::named("b").requires(["nope"]),
        ]);
        let result = validate(&commands);
        assert!(!result.valid);
        assert_eq!(result.find("MISSING_DEPENDENCY").unwrap().edges.len(), 2);
    }

    // ------------------------------------------------------------------------
    // Cycles
    // ------------------------------------------------------------------------

    #[test]
    fn test_required_cycle() {
        let commands = commands_with(vec![
            DependencySpec::named("robin").requires(["tuck"]),
            DependencySpec::named("tuck").requires(["robin"]),
        ]);
        let result = validate(&commands);

        assert!(!result.valid);
        let issue = result.find("REQUIRED_CYCLE").unwrap();
        assert_eq!(issue.nodes, vec!["robin", "tuck"]);
        assert!(result.find("OPTIONAL_CYCLE").is_none());
    }

    #[test]
    fn test_required_self_loop() {
        let commands = commands_with(vec![DependencySpec::named("me").requires(["me"])]);
        let result = validate(&commands);
        assert_eq!(result.find("REQUIRED_CYCLE").unwrap().nodes, vec!["me"]);
    }

    #[test]
    fn test_optional_cycle_is_warning() {
        let commands = commands_with(vec![
            DependencySpec::named("egg").possibly(["hen"]),
            DependencySpec::named("hen").requires(["egg"]),
        ]);
        let result = validate(&commands);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "OPTIONAL_CYCLE");
        assert_eq!(result.warnings[0].nodes, vec!["egg", "hen"]);
    }

    #[test]
    fn test_two_separate_cycles() {
        let commands = commands_with(vec![
            DependencySpec::named("a").requires(["b"]),
            DependencySpec::named("b").requires(["a"]),
            DependencySpec::named("c").requires(["d"]),
            DependencySpec::named("d").requires(["c"]),
        ]);
        let result = validate(&commands);
        assert_eq!(
            result.errors.iter().filter(|e| e.code == "REQUIRED_CYCLE").count(),
            2
        );
    }

    // ------------------------------------------------------------------------
    // Unused dependencies
    // ------------------------------------------------------------------------

    #[test]
    fn test_unused_dependency_info() {
        let commands = commands_with(vec![
            DependencySpec::named("used"),
            DependencySpec::named("lonely"),
        ]);
        commands.register_command(CommandSpec::named("go").requires(["used"]), |_, _| Ok(())).unwrap();

        let result = validate(&commands);
        assert!(result.valid);
        assert_eq!(result.find("UNUSED_DEPENDENCY").unwrap().nodes, vec!["lonely"]);
    }

    #[test]
    fn test_validation_result_serializes() {
        let result = validate(&sample_commands());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("MISSING_DEPENDENCY"));
    }
}
