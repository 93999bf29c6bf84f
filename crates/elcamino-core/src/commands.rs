//! The [`Commands`] context.
//!
//! `Commands` owns the dependency and command registries. Plugin code
//! registers into a `Commands` it is handed (or a `static` one), and callers
//! resolve or run through the same instance. There is no process-wide
//! registry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use elcamino_core::{argparser, argument, CommandSpec, Commands, Dependencies, DependencySpec};
//!
//! let commands = Commands::new();
//!
//! commands.register_dependency(DependencySpec::named("bar"), |_, _| Ok("I'm a bar")).unwrap();
//! commands.register_command(
//!     CommandSpec::named("echo")
//!         .requires(["bar"])
//!         .parser(argparser([argument("word")])),
//!     |args, deps| {
//!         let word = args.get_one::<String>("word").cloned().unwrap_or_default();
//!         Ok(format!("{word} {}", deps.get::<&str>("bar")?))
//!     },
//! ).unwrap();
//!
//! let out: Arc<String> = commands.run_as(&["echo", "hi"], Dependencies::new()).unwrap();
//! assert_eq!(*out, "hi I'm a bar");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use log::info;

use crate::command::{Arguments, CommandRegistry, CommandSpec, OverrideMode, erase_command};
use crate::dependency::{
    Dependencies, DependencySpec, PossibleDependencies, Value, downcast, erase_producer,
};
use crate::error::{Error, Result};
use crate::resolver::{self, DependencyRegistry};

/// A command and dependency gatherer.
pub struct Commands {
    dependencies: DependencyRegistry,
    commands: CommandRegistry,
}

impl Commands {
    /// Create a context with empty registries.
    pub fn new() -> Self {
        Self {
            dependencies: DependencyRegistry::new("dependency"),
            commands: CommandRegistry::new("command"),
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Registration function for a dependency producer.
    ///
    /// The returned closure registers the producer it is given and returns
    /// it unchanged. Without an explicit name the producer's function name
    /// is used.
    ///
    /// # Errors
    ///
    /// [`Error::Unnamed`] when the spec has no name and `F` is a closure or
    /// `fn` pointer.
    ///
    /// ```
    /// use elcamino_core::{Commands, Dependencies, DependencySpec, PossibleDependencies, Result};
    ///
    /// fn a_bar(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<&'static str> {
    ///     Ok("I'm a bar")
    /// }
    ///
    /// let commands = Commands::new();
    /// let a_bar = commands.dependency(DependencySpec::named("bar")).unwrap()(a_bar);
    ///
    /// // Still callable directly.
    /// assert_eq!(a_bar(&Dependencies::new(), &PossibleDependencies::new()).unwrap(), "I'm a bar");
    /// assert!(commands.dependency_registry().contains("bar"));
    /// ```
    pub fn dependency<F, T>(&self, spec: DependencySpec) -> Result<impl FnOnce(F) -> F + '_>
    where
        F: Fn(&Dependencies, &PossibleDependencies<'_>) -> Result<T> + Clone + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let (name, meta) = spec.into_parts();
        self.dependencies.register(name, meta, erase_producer::<F, T>)
    }

    /// Register a dependency producer directly.
    ///
    /// # Errors
    ///
    /// [`Error::Unnamed`] when the spec has no name and `F` has none of its
    /// own.
    pub fn register_dependency<F, T>(&self, spec: DependencySpec, producer: F) -> Result<()>
    where
        F: Fn(&Dependencies, &PossibleDependencies<'_>) -> Result<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let (name, meta) = spec.into_parts();
        let name = self.dependencies.resolve_name::<F>(name)?;
        self.dependencies.insert(name, erase_producer(producer), meta);
        Ok(())
    }

    /// Registration function for a command.
    ///
    /// # Errors
    ///
    /// As for [`Commands::dependency`].
    pub fn command<F, T>(&self, spec: CommandSpec) -> Result<impl FnOnce(F) -> F + '_>
    where
        F: Fn(&Arguments, &Dependencies) -> Result<T> + Clone + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let (name, meta) = spec.into_parts();
        self.commands.register(name, meta, erase_command::<F, T>)
    }

    /// Register a command directly.
    ///
    /// # Errors
    ///
    /// As for [`Commands::register_dependency`].
    pub fn register_command<F, T>(&self, spec: CommandSpec, command: F) -> Result<()>
    where
        F: Fn(&Arguments, &Dependencies) -> Result<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let (name, meta) = spec.into_parts();
        let name = self.commands.resolve_name::<F>(name)?;
        self.commands.insert(name, erase_command(command), meta);
        Ok(())
    }

    /// The dependency registry.
    pub fn dependency_registry(&self) -> &DependencyRegistry {
        &self.dependencies
    }

    /// The command registry.
    pub fn command_registry(&self) -> &CommandRegistry {
        &self.commands
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve dependencies and generate them.
    ///
    /// See [`resolver::mkgraph`].
    pub fn mkgraph<S: AsRef<str>>(&self, names: &[S]) -> Result<Dependencies> {
        resolver::mkgraph(&self.dependencies, names)
    }

    /// Resolve with `seed` pre-loaded. See [`resolver::mkgraph_with`].
    pub fn mkgraph_with<S: AsRef<str>>(
        &self,
        names: &[S],
        seed: Dependencies,
    ) -> Result<Dependencies> {
        resolver::mkgraph_with(&self.dependencies, names, seed)
    }

    // ------------------------------------------------------------------------
    // Running
    // ------------------------------------------------------------------------

    /// Run a command.
    ///
    /// `args[0]` names the command and `args[1..]` go to its parser.
    /// `override_dependencies` replace (or add to) the resolved top-level
    /// dependencies after resolution.
    ///
    /// # Errors
    ///
    /// `EmptyArguments`, `NotFound` for an unknown command, any resolution
    /// error, `Arguments` if parsing fails, or the command's own error.
    pub fn run<S: AsRef<str>>(
        &self,
        args: &[S],
        override_dependencies: Dependencies,
    ) -> Result<Value> {
        self.run_with(args, override_dependencies, OverrideMode::Replace)
    }

    /// Run a command, choosing how overrides apply.
    pub fn run_with<S: AsRef<str>>(
        &self,
        args: &[S],
        override_dependencies: Dependencies,
        mode: OverrideMode,
    ) -> Result<Value> {
        let (name, rest) = args.split_first().ok_or(Error::EmptyArguments)?;
        let name = name.as_ref();
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| Error::command_not_found(name))?;
        let meta = command.metadata();

        let graph = match mode {
            OverrideMode::Replace => {
                let mut graph = self.mkgraph(&meta.required)?;
                graph.extend(override_dependencies);
                graph
            }
            OverrideMode::Seed => self.mkgraph_with(&meta.required, override_dependencies)?,
        };

        let raw: Vec<String> = rest.iter().map(|arg| arg.as_ref().to_string()).collect();
        let parsed = meta.parser.parse(&raw)?;

        info!("running command '{name}'");
        (command.producer())(&parsed, &graph)
    }

    /// [`run`](Self::run) and downcast the command's return value.
    pub fn run_as<T: Any + Send + Sync, S: AsRef<str>>(
        &self,
        args: &[S],
        override_dependencies: Dependencies,
    ) -> Result<Arc<T>> {
        let name = args.first().map(|n| n.as_ref().to_string()).unwrap_or_default();
        downcast(&name, self.run(args, override_dependencies)?)
    }
}

impl Default for Commands {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("dependencies", &self.dependencies.names())
            .field("commands", &self.commands.names())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
