//! Dependency graph resolution.
//!
//! [`mkgraph`] turns a set of requested dependency names into a
//! [`Dependencies`] mapping by walking the registered producers depth-first.
//!
//! Each call owns a fresh resolution context:
//!
//! - a memo of values produced so far, so every name is produced at most
//!   once and all requesters share the same `Arc`;
//! - the route (names on the current recursion path), passed by value down
//!   the stack, to detect circular dependencies.
//!
//! Optional dependencies become closures that borrow the context; invoking
//! one re-enters resolution with the route captured at binding time and the
//! shared memo.

use std::cell::RefCell;
use std::sync::Arc;

use log::{debug, trace};

use crate::dependency::{Dependencies, DependencyMeta, PossibleDependencies, Producer, Value};
use crate::error::{Error, Result};
use crate::registry::{Collection, Registry};

/// Registry of dependency producers.
pub type DependencyRegistry = Registry<Producer, DependencyMeta>;

/// Resolve `names` against `registry`.
///
/// The result holds every requested name, their transitive required
/// dependencies, and any optional dependency whose builder was invoked.
///
/// # Errors
///
/// Fails fast with the first error: `NotFound` for an unregistered name,
/// `CircularDependency` when a name reappears on its own route, or whatever
/// a producer returned. No partial graph is returned.
pub fn mkgraph<S: AsRef<str>>(registry: &DependencyRegistry, names: &[S]) -> Result<Dependencies> {
    mkgraph_with(registry, names, Dependencies::new())
}

/// Resolve `names` with `seed` pre-loaded into the memo.
///
/// Seeded names are never produced; every requester, at any depth, receives
/// the seeded value. Seeded entries are part of the result.
pub fn mkgraph_with<S: AsRef<str>>(
    registry: &DependencyRegistry,
    names: &[S],
    seed: Dependencies,
) -> Result<Dependencies> {
    let collection = registry.collect();
    let context = ResolutionContext::new(&collection, seed);
    for name in names {
        context.build(name.as_ref(), &[])?;
    }
    Ok(context.finish())
}

struct ResolutionContext<'c> {
    collection: &'c Collection<Producer, DependencyMeta>,
    memo: RefCell<Dependencies>,
}

impl<'c> ResolutionContext<'c> {
    fn new(collection: &'c Collection<Producer, DependencyMeta>, seed: Dependencies) -> Self {
        Self {
            collection,
            memo: RefCell::new(seed),
        }
    }

    fn build(&self, name: &str, route: &[String]) -> Result<Value> {
        if route.iter().any(|on_route| on_route == name) {
            return Err(Error::circular(name, route));
        }
        if let Some(value) = self.memo.borrow().value(name) {
            trace!("dependency '{name}' already resolved");
            return Ok(Arc::clone(value));
        }

        let entry = self.collection.get(name).ok_or_else(|| {
            Error::dependency_not_found(name, route.last().map(String::as_str))
        })?;

        let mut route = route.to_vec();
        route.push(name.to_string());

        let meta = entry.metadata();
        let mut required = Dependencies::new();
        for dep in &meta.required {
            let value = self.build(dep, &route)?;
            required.insert_value(dep.clone(), value);
        }

        let mut possible = PossibleDependencies::new();
        for dep in &meta.optional {
            let target = dep.clone();
            let route = route.clone();
            possible.insert(dep.clone(), Box::new(move || self.build(&target, &route)));
        }

        debug!("producing dependency '{name}'");
        let value = (entry.producer())(&required, &possible)?;
        self.memo
            .borrow_mut()
            .insert_value(name.to_string(), Arc::clone(&value));
        Ok(value)
    }

    fn finish(self) -> Dependencies {
        self.memo.into_inner()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{DependencySpec, erase_producer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn register<T, F>(registry: &DependencyRegistry, spec: DependencySpec, f: F)
    where
        F: Fn(&Dependencies, &PossibleDependencies<'_>) -> Result<T> + Send + Sync + 'static,
        T: std::any::Any + Send + Sync,
    {
        let (name, meta) = spec.into_parts();
        registry.insert(name.unwrap_or_default(), erase_producer(f), meta);
    }

    fn registry() -> DependencyRegistry {
        DependencyRegistry::new("dependency")
    }

    #[test]
    fn test_mkgraph_single() {
        let reg = registry();
        register(&reg, DependencySpec::named("bar"), |_, _| Ok("I'm a bar"));

        let graph = mkgraph(&reg, &["bar"]).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(*graph.get::<&str>("bar").unwrap(), "I'm a bar");
    }

    #[test]
    fn test_mkgraph_empty_request() {
        let reg = registry();
        register(&reg, DependencySpec::named("bar"), |_, _| Ok(()));
        let names: [&str; 0] = [];
        assert!(mkgraph(&reg, &names).unwrap().is_empty());
    }

    #[test]
    fn test_mkgraph_includes_transitive_required() {
        let reg = registry();
        register(&reg, DependencySpec::named("a").requires(["b"]), |_, _| Ok(1));
        register(&reg, DependencySpec::named("b").requires(["c"]), |_, _| Ok(2));
        register(&reg, DependencySpec::named("c"), |_, _| Ok(3));
        register(&reg, DependencySpec::named("unrelated"), |_, _| Ok(4));

        let graph = mkgraph(&reg, &["a"]).unwrap();
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mkgraph_required_values_passed() {
        let reg = registry();
        register(&reg, DependencySpec::named("base"), |_, _| Ok(20_i64));
        register(
            &reg,
            DependencySpec::named("double").requires(["base"]),
            |deps, _| Ok(*deps.get::<i64>("base")? * 2),
        );

        let graph = mkgraph(&reg, &["double"]).unwrap();
        assert_eq!(*graph.get::<i64>("double").unwrap(), 40);
    }

    #[test]
    fn test_mkgraph_memoizes_within_call() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        register(&reg, DependencySpec::named("shared"), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0_u8)
        });
        register(&reg, DependencySpec::named("left").requires(["shared"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("right").requires(["shared"]), |_, _| Ok(()));

        mkgraph(&reg, &["left", "right", "shared"]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mkgraph_fresh_memo_per_call() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        register(&reg, DependencySpec::named("n"), move |_, _| {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let first = mkgraph(&reg, &["n"]).unwrap();
        let second = mkgraph(&reg, &["n"]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(
            &first.get::<usize>("n").unwrap(),
            &second.get::<usize>("n").unwrap()
        ));
    }

    #[test]
    fn test_mkgraph_self_cycle() {
        let reg = registry();
        register(&reg, DependencySpec::named("me").requires(["me"]), |_, _| Ok(()));

        let err = mkgraph(&reg, &["me"]).unwrap_err();
        match err {
            Error::CircularDependency { name, route } => {
                assert_eq!(name, "me");
                assert_eq!(route, vec!["me"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mkgraph_cycle_route_is_ordered() {
        let reg = registry();
        register(&reg, DependencySpec::named("robin").requires(["tuck"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("tuck").requires(["marian"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("marian").requires(["robin"]), |_, _| Ok(()));

        let err = mkgraph(&reg, &["robin"]).unwrap_err();
        match err {
            Error::CircularDependency { name, route } => {
                assert_eq!(name, "robin");
                assert_eq!(route, vec!["robin", "tuck", "marian"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mkgraph_diamond_is_not_a_cycle() {
        let reg = registry();
        register(&reg, DependencySpec::named("top").requires(["l", "r"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("l").requires(["bottom"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("r").requires(["bottom"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("bottom"), |_, _| Ok(()));

        assert_eq!(mkgraph(&reg, &["top"]).unwrap().len(), 4);
    }

    #[test]
    fn test_mkgraph_missing_required_names_requester() {
        let reg = registry();
        register(&reg, DependencySpec::named("foo").requires(["ghost"]), |_, _| Ok(()));

        let err = mkgraph(&reg, &["foo"]).unwrap_err();
        match err {
            Error::NotFound {
                name, requested_by, ..
            } => {
                assert_eq!(name, "ghost");
                assert_eq!(requested_by.as_deref(), Some("foo"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mkgraph_missing_top_level() {
        let reg = registry();
        let err = mkgraph(&reg, &["nothing"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mkgraph_optional_not_resolved_unless_invoked() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        register(&reg, DependencySpec::named("maybe"), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        register(&reg, DependencySpec::named("lazy").possibly(["maybe"]), |_, possible| {
            Ok(possible.contains("maybe"))
        });

        let graph = mkgraph(&reg, &["lazy"]).unwrap();
        assert!(*graph.get::<bool>("lazy").unwrap());
        assert!(!graph.contains("maybe"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mkgraph_optional_missing_only_fails_when_invoked() {
        let reg = registry();
        register(&reg, DependencySpec::named("quiet").possibly(["ghost"]), |_, _| Ok(()));
        register(&reg, DependencySpec::named("loud").possibly(["ghost"]), |_, possible| {
            possible.build("ghost").map(|_| ())
        });

        assert!(mkgraph(&reg, &["quiet"]).is_ok());
        let err = mkgraph(&reg, &["loud"]).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { ref requested_by, .. } if requested_by.as_deref() == Some("loud")
        ));
    }

    #[test]
    fn test_mkgraph_optional_shares_memo() {
        let reg = registry();
        register(&reg, DependencySpec::named("bar"), |_, _| Ok(7_u32));
        register(&reg, DependencySpec::named("twice").possibly(["bar"]), |_, possible| {
            let first = possible.get::<u32>("bar")?;
            let second = possible.get::<u32>("bar")?;
            Ok(Arc::ptr_eq(&first, &second))
        });

        let graph = mkgraph(&reg, &["bar", "twice"]).unwrap();
        assert!(*graph.get::<bool>("twice").unwrap());
    }

    #[test]
    fn test_mkgraph_optional_cycle_detected_on_invoke() {
        let reg = registry();
        register(&reg, DependencySpec::named("egg").possibly(["hen"]), |_, possible| {
            possible.build("hen").map(|_| ())
        });
        register(&reg, DependencySpec::named("hen").requires(["egg"]), |_, _| Ok(()));

        let err = mkgraph(&reg, &["egg"]).unwrap_err();
        assert!(err.is_cycle());
    }

    #[test]
    fn test_mkgraph_producer_error_propagates() {
        let reg = registry();
        register(&reg, DependencySpec::named("broken"), |_, _| -> Result<()> {
            Err(Error::msg("boom"))
        });
        register(&reg, DependencySpec::named("user").requires(["broken"]), |_, _| Ok(()));

        let err = mkgraph(&reg, &["user"]).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_mkgraph_with_seed_preempts_producer() {
        let reg = registry();
        register(&reg, DependencySpec::named("bar"), |_, _| Ok("real"));
        register(&reg, DependencySpec::named("foo").requires(["bar"]), |deps, _| {
            Ok(*deps.get::<&str>("bar")?)
        });

        let seed = Dependencies::new().with("bar", "seeded");
        let graph = mkgraph_with(&reg, &["foo"], seed).unwrap();
        assert_eq!(*graph.get::<&str>("foo").unwrap(), "seeded");
        assert_eq!(*graph.get::<&str>("bar").unwrap(), "seeded");
    }

    #[test]
    fn test_mkgraph_with_seed_for_unregistered_name() {
        let reg = registry();
        register(&reg, DependencySpec::named("foo").requires(["external"]), |deps, _| {
            Ok(*deps.get::<u8>("external")? + 1)
        });

        let seed = Dependencies::new().with("external", 1_u8);
        let graph = mkgraph_with(&reg, &["foo"], seed).unwrap();
        assert_eq!(*graph.get::<u8>("foo").unwrap(), 2);
    }
}
