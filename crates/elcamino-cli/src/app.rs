//! ElCaminoCli application framework.
//!
//! Provides the CLI application that plugin hosts instantiate with their
//! [`Commands`] registry.

use std::io::{self, Write};
use std::sync::Arc;

use elcamino_core::{Commands, Dependencies, DependencySpec, Error, Result, Value};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, CliCommand, GraphSubcommand};
use crate::config::ElCaminoConfig;
use crate::{config_handlers, graph_handlers};

/// Name under which the loaded [`ElCaminoConfig`] is registered as a
/// dependency, unless a plugin already registered that name.
pub const CONFIG_DEPENDENCY: &str = "config";

// ============================================================================
// ElCaminoCli
// ============================================================================

/// CLI application over a shared [`Commands`] registry.
pub struct ElCaminoCli {
    name: String,
    commands: Arc<Commands>,
    config: ElCaminoConfig,
    version: String,
}

impl ElCaminoCli {
    /// Create a new CLI application with the default configuration.
    pub fn new(name: impl Into<String>, commands: Arc<Commands>) -> Self {
        Self {
            name: name.into(),
            commands,
            config: ElCaminoConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create from CLI args, loading config from file/env.
    pub fn from_args(
        name: impl Into<String>,
        commands: Arc<Commands>,
        args: &CliArgs,
    ) -> Result<Self> {
        let config = ElCaminoConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, commands).with_config(config))
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ElCaminoConfig) -> Self {
        self.config = config;
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ElCaminoConfig {
        &self.config
    }

    /// The command registry.
    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise the verbosity flags, otherwise the
    /// configured `log_level`.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&self.config.log_level)
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments, writing to stdout.
    ///
    /// Returns the value produced by a registered command, or `None` for
    /// built-in subcommands.
    pub fn run(&self, args: CliArgs) -> Result<Option<Value>> {
        self.init_logging(args.verbose, args.quiet);
        let stdout = io::stdout();
        self.run_to(args, &mut stdout.lock())
    }

    /// Run the CLI with the given arguments, writing to `out`.
    pub fn run_to<W: Write>(&self, args: CliArgs, out: &mut W) -> Result<Option<Value>> {
        self.register_config()?;
        match args.command {
            Some(CliCommand::List) => {
                graph_handlers::handle_list(&self.commands, out)?;
                Ok(None)
            }
            Some(CliCommand::Graph(graph_cmd)) => {
                self.handle_graph(graph_cmd.command, out)?;
                Ok(None)
            }
            Some(CliCommand::Config(config_cmd)) => {
                config_handlers::handle_config_command(
                    args.config.as_deref(),
                    config_cmd.command,
                    out,
                )?;
                Ok(None)
            }
            Some(CliCommand::External(raw)) => self.run_command(&raw).map(Some),
            None => match &self.config.commands.default {
                Some(default) => self.run_command(&[default.as_str()]).map(Some),
                None => {
                    writeln!(
                        out,
                        "{} {}: use --help for usage",
                        self.config.program_name, self.version
                    )?;
                    Ok(None)
                }
            },
        }
    }

    /// Run a registered command: `raw[0]` names it, the rest are its
    /// arguments.
    ///
    /// # Errors
    ///
    /// Validation errors when `graph.validate_before_run` is set, otherwise
    /// whatever [`Commands::run`] reports.
    pub fn run_command<S: AsRef<str>>(&self, raw: &[S]) -> Result<Value> {
        self.register_config()?;

        if self.config.graph.validate_before_run {
            let result = elcamino_graph::validate(&self.commands);
            if !result.valid {
                for issue in &result.errors {
                    log::error!("[{}] {}: {}", issue.code, issue.message, issue.nodes.join(", "));
                }
                return Err(Error::msg(format!(
                    "{}: registry has {} validation error(s)",
                    self.name,
                    result.errors.len()
                )));
            }
        }

        self.commands.run(raw, Dependencies::new())
    }

    fn register_config(&self) -> Result<()> {
        if self.commands.dependency_registry().contains(CONFIG_DEPENDENCY) {
            return Ok(());
        }
        let config = self.config.clone();
        self.commands.register_dependency(
            DependencySpec::named(CONFIG_DEPENDENCY),
            move |_, _| Ok(config.clone()),
        )
    }

    /// Dispatch graph subcommands to handlers.
    fn handle_graph<W: Write>(&self, command: GraphSubcommand, out: &mut W) -> Result<()> {
        match command {
            GraphSubcommand::Validate { json } => {
                graph_handlers::handle_validate(&self.commands, json, out)
            }
            GraphSubcommand::Order {
                names,
                commands,
                json,
            } => graph_handlers::handle_order(&self.commands, &names, commands, json, out),
            GraphSubcommand::Stats { json } => {
                graph_handlers::handle_stats(&self.commands, json, out)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
