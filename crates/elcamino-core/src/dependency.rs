//! The dependency producer model.
//!
//! A dependency producer is a function registered under a name that receives
//! two mappings and returns a value:
//!
//! - [`Dependencies`]: its *required* dependencies, already resolved;
//! - [`PossibleDependencies`]: its *optional* dependencies, as lazy builders
//!   that resolve only when called.
//!
//! Values are type-erased ([`Value`]) so one graph can hold producers of
//! unrelated types. Sharing a value across requesters clones the `Arc`, so
//! every requester observes the identical instance.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use elcamino_core::{Commands, DependencySpec, Result};
//!
//! let commands = Commands::new();
//!
//! commands.register_dependency(DependencySpec::named("greeting"), |_deps, _possible| {
//!     Ok("hello".to_string())
//! }).unwrap();
//! commands.register_dependency(
//!     DependencySpec::named("shout").requires(["greeting"]),
//!     |deps, _possible| -> Result<String> {
//!         Ok(deps.get::<String>("greeting")?.to_uppercase())
//!     },
//! ).unwrap();
//!
//! let graph = commands.mkgraph(&["shout"]).unwrap();
//! assert_eq!(*graph.get::<String>("shout").unwrap(), "HELLO");
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A type-erased, shareable dependency value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value as a [`Value`].
pub fn value<T: Any + Send + Sync>(v: T) -> Value {
    Arc::new(v)
}

/// Downcast a [`Value`] produced under `name`.
pub fn downcast<T: Any + Send + Sync>(name: &str, value: Value) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| Error::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

// ============================================================================
// Dependencies
// ============================================================================

/// A mapping from dependency name to resolved value.
///
/// This is what producers receive as their required dependencies, what
/// [`Commands::mkgraph`](crate::Commands::mkgraph) returns, and what
/// commands receive when they run.
#[derive(Clone, Default)]
pub struct Dependencies {
    values: BTreeMap<String, Value>,
}

impl Dependencies {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed access to a resolved dependency.
    ///
    /// # Errors
    ///
    /// `NotFound` when `name` is absent, `TypeMismatch` when it holds a
    /// value of another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(name, self.get_value(name)?)
    }

    /// Untyped access to a resolved dependency.
    pub fn get_value(&self, name: &str) -> Result<Value> {
        self.value(name)
            .cloned()
            .ok_or_else(|| Error::dependency_not_found(name, None))
    }

    /// Borrow the value stored under `name`, if any.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store a concrete value, replacing any previous one.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, v: T) {
        self.values.insert(name.into(), value(v));
    }

    /// Store an already type-erased value, replacing any previous one.
    pub fn insert_value(&mut self, name: impl Into<String>, v: Value) {
        self.values.insert(name.into(), v);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, v: T) -> Self {
        self.insert(name, v);
        self
    }

    /// Overlay `other` onto this mapping. Entries of `other` win.
    pub fn extend(&mut self, other: Dependencies) {
        self.values.extend(other.values);
    }

    /// Remove and return the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names present, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Dependencies {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ============================================================================
// PossibleDependencies
// ============================================================================

/// A zero-argument builder that resolves one optional dependency.
pub type Builder<'r> = Box<dyn Fn() -> Result<Value> + 'r>;

/// Lazy builders for a producer's optional dependencies.
///
/// Nothing is resolved until [`build`](Self::build) or [`get`](Self::get)
/// is called. Calling a builder again within the same resolution returns
/// the memoized value.
#[derive(Default)]
pub struct PossibleDependencies<'r> {
    builders: BTreeMap<String, Builder<'r>>,
}

impl<'r> PossibleDependencies<'r> {
    /// No optional dependencies.
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Attach the builder for `name`.
    pub fn insert(&mut self, name: impl Into<String>, builder: Builder<'r>) {
        self.builders.insert(name.into(), builder);
    }

    /// Resolve the optional dependency `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `name` was not declared as optional, otherwise whatever
    /// resolving it fails with.
    pub fn build(&self, name: &str) -> Result<Value> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| Error::dependency_not_found(name, None))?;
        builder()
    }

    /// Resolve the optional dependency `name` and downcast it.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(name, self.build(name)?)
    }

    /// Whether `name` was declared as optional.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Declared optional names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Number of declared optional dependencies.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no optional dependencies were declared.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl fmt::Debug for PossibleDependencies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

// ============================================================================
// Producers and metadata
// ============================================================================

/// A registered, type-erased dependency producer.
pub type Producer =
    Arc<dyn Fn(&Dependencies, &PossibleDependencies<'_>) -> Result<Value> + Send + Sync>;

/// Edges a dependency producer declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMeta {
    /// Resolved eagerly before the producer runs.
    pub required: Vec<String>,
    /// Exposed as lazy builders.
    pub optional: Vec<String>,
}

/// Registration parameters for a dependency producer.
///
/// ```
/// use elcamino_core::DependencySpec;
///
/// let spec = DependencySpec::named("foo").requires(["bar"]).possibly(["baz"]);
/// assert_eq!(spec.name(), Some("foo"));
/// assert_eq!(spec.meta().required, vec!["bar"]);
/// assert_eq!(spec.meta().optional, vec!["baz"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencySpec {
    name: Option<String>,
    meta: DependencyMeta,
}

impl DependencySpec {
    /// A spec with no name; the producer's function name is used.
    pub fn new() -> Self {
        Self::default()
    }

    /// A spec registering under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            meta: DependencyMeta::default(),
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

    /// Add optional ("possible") dependencies.
    pub fn possibly<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.optional.extend(names.into_iter().map(Into::into));
        self
    }

    /// The explicit name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The declared edges.
    pub fn meta(&self) -> &DependencyMeta {
        &self.meta
    }

    pub(crate) fn into_parts(self) -> (Option<String>, DependencyMeta) {
        (self.name, self.meta)
    }
}

/// Type-erase a typed producer.
pub(crate) fn erase_producer<F, T>(f: F) -> Producer
where
    F: Fn(&Dependencies, &PossibleDependencies<'_>) -> Result<T> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    Arc::new(
        move |deps: &Dependencies, possible: &PossibleDependencies<'_>| {
            f(deps, possible).map(value)
        },
    )
}

// ============================================================================
// Tests
// ============================================================================
