//! Registry graph inspection for El Camino.
//!
//! Builds a petgraph view of a [`Commands`](elcamino_core::Commands)
//! registry and answers questions about it without running any producer:
//! whether every declared name resolves, whether required edges form a
//! cycle, and in what order `mkgraph` would produce a set of names.
//!
//! # Modules
//!
//! - [`types`]: [`RegistryGraph`], nodes, edges and export
//! - [`validation`]: Missing names, cycles and unused dependencies
//! - [`order`]: Resolution order for a set of names
//! - [`stats`]: Registry statistics

#![doc = include_str!("../README.md")]

pub mod order;
pub mod stats;
pub mod types;
pub mod validation;

pub use order::{command_order, resolution_order};
pub use stats::{GraphStats, compute_graph_stats, compute_stats};
pub use types::{EdgeInfo, EdgeKind, GraphExport, GraphNode, NodeKind, RegistryGraph};
pub use validation::{ValidationIssue, ValidationResult, is_valid, validate, validate_graph};
