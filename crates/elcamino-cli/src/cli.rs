//! CLI argument parsing and command definitions.
//!
//! Built-in subcommands inspect the registry (`list`, `graph`) or the
//! configuration (`config`). Any other subcommand names a registered
//! command and is forwarded, with its raw arguments, to
//! [`Commands::run`](elcamino_core::Commands::run).

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for El Camino applications.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "ELCAMINO_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

/// Built-in subcommands, plus registered commands as external subcommands.
#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// List registered commands and dependencies.
    List,

    /// Registry graph operations.
    Graph(GraphCommand),

    /// Configuration operations.
    Config(ConfigCommand),

    /// Run a registered command.
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Graph-specific subcommands.
#[derive(Parser, Debug)]
pub struct GraphCommand {
    /// Graph subcommand to execute.
    #[command(subcommand)]
    pub command: GraphSubcommand,
}

/// Available graph subcommands.
#[derive(Subcommand, Debug)]
pub enum GraphSubcommand {
    /// Check for missing names and cycles.
    Validate {
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the order in which dependencies would be produced.
    Order {
        /// Dependency names to resolve.
        #[arg(required = true)]
        names: Vec<String>,

        /// Treat the names as commands and resolve what they require.
        #[arg(long)]
        commands: bool,

        /// Print the order as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show registry statistics.
    Stats {
        /// Print the statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Show the loaded configuration as TOML.
    Show,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "graph.validate_before_run").
        key: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
