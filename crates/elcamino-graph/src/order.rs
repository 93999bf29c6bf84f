//! Resolution order without running producers.

use std::collections::HashSet;

use elcamino_core::registry::Collection;
use elcamino_core::{Commands, DependencyMeta, Error, Result};

/// The order in which `mkgraph(names)` would produce the required closure
/// of `names`: every name appears after everything it requires.
///
/// Optional edges are not followed, since their builders may never run.
///
/// # Errors
///
/// `CircularDependency` and `NotFound`, with the same name, route, and
/// requester `mkgraph` would report.
pub fn resolution_order<S: AsRef<str>>(commands: &Commands, names: &[S]) -> Result<Vec<String>> {
    let collection = commands.dependency_registry().collect();
    let mut walk = Walk {
        collection: &collection,
        route: Vec::new(),
        done: HashSet::new(),
        order: Vec::new(),
    };
    for name in names {
        walk.visit(name.as_ref())?;
    }
    Ok(walk.order)
}

/// [`resolution_order`] for the dependencies a command declares.
pub fn command_order(commands: &Commands, command: &str) -> Result<Vec<String>> {
    let entry = commands
        .command_registry()
        .get(command)
        .ok_or_else(|| Error::command_not_found(command))?;
    resolution_order(commands, &entry.metadata().required)
}

struct Walk<'c, P> {
    collection: &'c Collection<P, DependencyMeta>,
    route: Vec<String>,
    done: HashSet<String>,
    order: Vec<String>,
}

impl<P> Walk<'_, P> {
    fn visit(&mut self, name: &str) -> Result<()> {
        if self.route.iter().any(|on_route| on_route == name) {
            return Err(Error::circular(name, &self.route));
        }
        if self.done.contains(name) {
            return Ok(());
        }
        let entry = self.collection.get(name).ok_or_else(|| {
            Error::dependency_not_found(name, self.route.last().map(String::as_str))
        })?;

        self.route.push(name.to_string());
        for dep in &entry.metadata().required {
            self.visit(dep)?;
        }
        self.route.pop();

        self.done.insert(name.to_string());
        self.order.push(name.to_string());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
