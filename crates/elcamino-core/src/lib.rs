//! El Camino Core: dependency registration, graph resolution, and command
//! dispatch.
//!
//! Plugins register *dependencies* (named producers of a value that may need
//! other dependencies) and *commands* (named entry points with declared
//! dependencies and an argument parser) on a [`Commands`] context. At run
//! time the context resolves a set of names into a memoized object graph and
//! invokes commands with it.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`registry`]: Generic named-registration collector
//! - [`dependency`]: Producer model, [`Dependencies`] and lazy optional builders
//! - [`resolver`]: Dependency graph resolution (`mkgraph`)
//! - [`command`]: Command metadata and argument parsers
//! - [`commands`]: The [`Commands`] context and command runner

#![doc = include_str!("../README.md")]

pub mod command;
pub mod commands;
pub mod dependency;
pub mod error;
pub mod registry;
pub mod resolver;

// Re-export key types at crate root for convenience
pub use command::{
    ArgumentParser, Arguments, CommandMeta, CommandRegistry, CommandSpec, OverrideMode, argparser,
    argument,
};
pub use commands::Commands;
pub use dependency::{
    Dependencies, DependencyMeta, DependencySpec, PossibleDependencies, Value, downcast, value,
};
pub use error::{EntryKind, Error, Result};
pub use registry::{RegisteredEntry, Registry};
pub use resolver::DependencyRegistry;
