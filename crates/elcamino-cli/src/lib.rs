//! CLI framework for El Camino plugin hosts.
//!
//! A host builds a [`Commands`](elcamino_core::Commands) registry, lets its
//! plugins register dependencies and commands on it, and hands it to
//! [`ElCaminoCli`]. Registered commands become subcommands; `list`, `graph`,
//! and `config` are built in.
//!
//! # Key Abstractions
//!
//! - [`ElCaminoCli`]: the application, over a shared registry
//! - [`CliArgs`]: clap-derived arguments
//! - [`ElCaminoConfig`]: confyg-loaded configuration

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod graph_handlers;

pub use app::{CONFIG_DEPENDENCY, ElCaminoCli};
pub use cli::{CliArgs, CliCommand, ConfigAction, GraphSubcommand};
pub use config::ElCaminoConfig;
