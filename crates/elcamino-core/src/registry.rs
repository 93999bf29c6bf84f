//! Named-registration collector.
//!
//! A [`Registry`] maps names to [`RegisteredEntry`] values: a producer plus
//! whatever metadata the registering façade attaches. Each
//! [`Commands`](crate::Commands) owns two of them, one for dependency
//! producers and one for commands.
//!
//! Registration happens through `&self` so a registry can sit inside a
//! `static` context and be filled in by plugin code at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::error::{Error, Result};

// ============================================================================
// Entries
// ============================================================================

/// A producer registered under a name, with its attached metadata.
pub struct RegisteredEntry<P, M> {
    name: String,
    producer: P,
    metadata: M,
}

impl<P, M> RegisteredEntry<P, M> {
    /// The name this entry was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered producer.
    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Metadata attached at registration time.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }
}

impl<P, M: fmt::Debug> fmt::Debug for RegisteredEntry<P, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredEntry")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a registry's entries, keyed by name.
pub type Collection<P, M> = BTreeMap<String, Arc<RegisteredEntry<P, M>>>;

// ============================================================================
// Registry
// ============================================================================

/// Name-keyed store of producers and their metadata.
///
/// Re-registering an existing name replaces the earlier entry.
pub struct Registry<P, M> {
    label: &'static str,
    entries: RwLock<Collection<P, M>>,
}

impl<P, M> Registry<P, M> {
    /// Create an empty registry. `label` only appears in log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store `producer` under `name`, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, producer: P, metadata: M) {
        let name = name.into();
        let entry = Arc::new(RegisteredEntry {
            name: name.clone(),
            producer,
            metadata,
        });
        let previous = self.entries.write().insert(name.clone(), entry);
        if previous.is_some() {
            warn!("{} '{}' registered twice, last registration wins", self.label, name);
        } else {
            debug!("registered {} '{}'", self.label, name);
        }
    }

    /// Build a registration function for a producer of type `F`.
    ///
    /// The returned closure stores `erase(producer.clone())` under `name`
    /// (or under the producer's own function name when `name` is `None`)
    /// and hands the original producer back, so call sites can keep using
    /// it directly.
    ///
    /// # Errors
    ///
    /// [`Error::Unnamed`] when `name` is `None` and `F` has no name of its
    /// own (closures, `fn` pointers).
    pub fn register<'a, F>(
        &'a self,
        name: Option<String>,
        metadata: M,
        erase: fn(F) -> P,
    ) -> Result<impl FnOnce(F) -> F + 'a>
    where
        F: Clone + 'a,
    {
        let name = self.resolve_name::<F>(name)?;
        Ok(move |producer: F| {
            self.insert(name, erase(producer.clone()), metadata);
            producer
        })
    }

    /// The explicit `name`, or else the declared name of `F`.
    ///
    /// # Errors
    ///
    /// [`Error::Unnamed`] when neither exists.
    pub fn resolve_name<F>(&self, name: Option<String>) -> Result<String> {
        match name.or_else(producer_name::<F>) {
            Some(name) => Ok(name),
            None => Err(Error::Unnamed {
                kind: self.label,
                type_name: std::any::type_name::<F>().to_string(),
            }),
        }
    }

    /// Snapshot of every entry currently registered.
    pub fn collect(&self) -> Collection<P, M> {
        self.entries.read().clone()
    }

    /// Look up a single entry.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredEntry<P, M>>> {
        self.entries.read().get(name).cloned()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<P, M: fmt::Debug> fmt::Debug for Registry<P, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.label)
            .field("names", &self.names())
            .finish()
    }
}

/// The declared name of a producer type.
///
/// For `fn` items this is the function's own identifier. Closures and `fn`
/// pointers have no identifier of their own and give `None`.
pub fn producer_name<F>() -> Option<String> {
    let full = std::any::type_name::<F>();
    if ["fn(", "for<", "unsafe ", "extern "].iter().any(|p| full.starts_with(p)) {
        return None;
    }
    let path = full.split('<').next().unwrap_or(full);
    let name = path.rsplit("::").next().unwrap_or(path);
    if name.starts_with('{') {
        return None;
    }
    Some(name.to_string())
}

// ============================================================================
// Tests
// ============================================================================
