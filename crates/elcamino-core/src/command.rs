//! Commands and their argument parsers.
//!
//! A command is a named entry point. It declares the dependencies it needs
//! and an [`ArgumentParser`] that turns raw arguments into [`Arguments`].
//! When run, it receives the parsed arguments and the resolved
//! [`Dependencies`].
//!
//! Argument parsing is delegated to clap; the framework never inspects the
//! parsed result.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use clap::{Arg, ArgMatches};

use crate::dependency::{Dependencies, Value, value};
use crate::error::{Error, Result};
use crate::registry::Registry;

/// Parsed command arguments.
pub type Arguments = ArgMatches;

// ============================================================================
// Argument parsers
// ============================================================================

type ParseFn = dyn Fn(&[String]) -> Result<Arguments> + Send + Sync;

/// Turns a raw argument sequence into [`Arguments`].
///
/// The default parser accepts no arguments at all.
#[derive(Clone)]
pub struct ArgumentParser {
    parse: Arc<ParseFn>,
}

impl ArgumentParser {
    /// Wrap any parsing function.
    pub fn new<F>(parse: F) -> Self
    where
        F: Fn(&[String]) -> Result<Arguments> + Send + Sync + 'static,
    {
        Self {
            parse: Arc::new(parse),
        }
    }

    /// Parse with a clap command. The raw arguments carry no binary name.
    pub fn from_command(command: clap::Command) -> Self {
        let command = command.no_binary_name(true);
        Self::new(move |raw| {
            command
                .clone()
                .try_get_matches_from(raw)
                .map_err(|e| Error::Arguments(e.to_string()))
        })
    }

    /// Parse `raw`.
    pub fn parse(&self, raw: &[String]) -> Result<Arguments> {
        (self.parse)(raw)
    }
}

impl Default for ArgumentParser {
    fn default() -> Self {
        Self::from_command(clap::Command::new("command"))
    }
}

impl fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArgumentParser")
    }
}

/// Build a parser from a list of clap arguments.
///
/// ```
/// use elcamino_core::{argparser, argument};
///
/// let parser = argparser([argument("lala")]);
/// let parsed = parser.parse(&["heee".to_string()]).unwrap();
/// assert_eq!(parsed.get_one::<String>("lala").unwrap(), "heee");
/// ```
pub fn argparser(args: impl IntoIterator<Item = Arg>) -> ArgumentParser {
    ArgumentParser::from_command(clap::Command::new("command").args(args))
}

/// A required positional argument.
pub fn argument(name: impl Into<clap::Id>) -> Arg {
    Arg::new(name).required(true)
}

// ============================================================================
// Command metadata
// ============================================================================

/// A registered, type-erased command function.
pub type CommandFn = Arc<dyn Fn(&Arguments, &Dependencies) -> Result<Value> + Send + Sync>;

/// What a command declares at registration.
#[derive(Debug, Clone, Default)]
pub struct CommandMeta {
    /// Dependencies resolved before the command runs.
    pub required: Vec<String>,
    /// Parser for the raw arguments following the command name.
    pub parser: ArgumentParser,
}

/// Registry of commands.
pub type CommandRegistry = Registry<CommandFn, CommandMeta>;

/// Registration parameters for a command.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    name: Option<String>,
    meta: CommandMeta,
}

impl CommandSpec {
    /// A spec with no name; the command function's name is used.
    pub fn new() -> Self {
        Self::default()
    }

    /// A spec registering under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            meta: CommandMeta::default(),
        }
    }

    /// Add required dependencies.
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the argument parser.
    pub fn parser(mut self, parser: ArgumentParser) -> Self {
        self.meta.parser = parser;
        self
    }

    /// The explicit name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The declared metadata.
    pub fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    pub(crate) fn into_parts(self) -> (Option<String>, CommandMeta) {
        (self.name, self.meta)
    }
}

/// Type-erase a typed command function.
pub(crate) fn erase_command<F, T>(f: F) -> CommandFn
where
    F: Fn(&Arguments, &Dependencies) -> Result<T> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    Arc::new(move |args: &Arguments, deps: &Dependencies| f(args, deps).map(value))
}

/// How `run` applies caller-supplied dependency overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverrideMode {
    /// Resolve normally, then replace top-level entries. Producers that
    /// required an overridden name still saw the registered value.
    #[default]
    Replace,
    /// Seed the resolver, so overridden names are never produced and every
    /// requester sees the override.
    Seed,
}

// ============================================================================
// Tests
// ============================================================================
