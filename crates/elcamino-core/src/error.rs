//! Error types for El Camino operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all El Camino crates. Uses `thiserror` for derive macros.

use std::fmt;

use thiserror::Error;

/// Which registry an entry was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A dependency producer.
    Dependency,
    /// A command.
    Command,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Dependency => f.write_str("dependency"),
            EntryKind::Command => f.write_str("command"),
        }
    }
}

/// Errors that can occur while registering, resolving, or running.
#[derive(Error, Debug)]
pub enum Error {
    /// No entry is registered under the requested name.
    #[error("{kind} not found: {name}{}", requester_suffix(.requested_by))]
    NotFound {
        /// Registry that was searched.
        kind: EntryKind,
        /// The missing name.
        name: String,
        /// The dependency that asked for it, if any.
        requested_by: Option<String>,
    },

    /// A required-dependency chain revisits a name on its own route.
    #[error("circular dependency detected: {name} (route: {})", .route.join(" -> "))]
    CircularDependency {
        /// The name requested twice.
        name: String,
        /// Names on the recursion path, outermost first.
        route: Vec<String>,
    },

    /// A resolved value is not of the type the caller asked for.
    #[error("dependency '{name}' is not a {expected}")]
    TypeMismatch {
        /// Name of the dependency.
        name: String,
        /// Type name the caller expected.
        expected: &'static str,
    },

    /// A producer was registered without a name and has none of its own.
    #[error("{kind} producer '{type_name}' has no name of its own; register it under an explicit name")]
    Unnamed {
        /// Registry label.
        kind: &'static str,
        /// Type name of the producer.
        type_name: String,
    },

    /// The argument parser rejected the raw arguments.
    #[error("invalid arguments: {0}")]
    Arguments(String),

    /// `run` was called without a command name.
    #[error("no command name given")]
    EmptyArguments,

    /// A producer or command failed with a foreign error.
    #[error(transparent)]
    Producer(Box<dyn std::error::Error + Send + Sync>),

    /// A producer or command failed with a plain message.
    #[error("{0}")]
    Message(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn requester_suffix(requested_by: &Option<String>) -> String {
    match requested_by {
        Some(requester) => format!(" (required by {requester})"),
        None => String::new(),
    }
}

impl Error {
    /// Create a not found error for a dependency.
    pub fn dependency_not_found(name: impl Into<String>, requested_by: Option<&str>) -> Self {
        Self::NotFound {
            kind: EntryKind::Dependency,
            name: name.into(),
            requested_by: requested_by.map(str::to_string),
        }
    }

    /// Create a not found error for a command.
    pub fn command_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntryKind::Command,
            name: name.into(),
            requested_by: None,
        }
    }

    /// Create a circular dependency error.
    pub fn circular(name: impl Into<String>, route: &[String]) -> Self {
        Self::CircularDependency {
            name: name.into(),
            route: route.to_vec(),
        }
    }

    /// Wrap a foreign error raised inside a producer or command.
    pub fn producer(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Producer(Box::new(err))
    }

    /// Create a message error.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a `CircularDependency` error.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}

/// Result type alias using El Camino's Error type.
pub type Result<T> = std::result::Result<T, Error>;
