//! Some plugins to support the tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use elcamino_core::{
    Arguments, CommandSpec, Commands, Dependencies, DependencySpec, PossibleDependencies, Result,
    argparser, argument,
};

pub static COMMANDS: LazyLock<Commands> = LazyLock::new(|| {
    let commands = Commands::new();
    register(&commands);
    commands
});

/// Something that displays lines of text.
#[derive(Clone)]
pub struct Printer(Arc<dyn Fn(&str) + Send + Sync>);

impl Printer {
    pub fn new(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn print(&self, line: &str) {
        (self.0)(line)
    }
}

#[derive(Debug, PartialEq)]
pub struct Foo {
    pub bar: Arc<String>,
}

#[derive(Debug, PartialEq)]
pub struct NeedsRand {
    pub rand: Arc<u64>,
}

/// Depend on a bar object.
pub fn a_foo(deps: &Dependencies, _: &PossibleDependencies<'_>) -> Result<Foo> {
    Ok(Foo {
        bar: deps.get("bar")?,
    })
}

/// Depend on a bar object in an optional way.
pub fn foo_2(_: &Dependencies, possible: &PossibleDependencies<'_>) -> Result<Foo> {
    Ok(Foo {
        bar: possible.get("bar")?,
    })
}

/// Return a bar-like object.
pub fn a_bar(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<String> {
    Ok("I'm a bar".to_string())
}

static NEXT: AtomicU64 = AtomicU64::new(1);

/// A different number every time it is produced.
pub fn rand(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<u64> {
    Ok(NEXT.fetch_add(1, Ordering::SeqCst))
}

/// Depend on a random number.
pub fn needs_rand(deps: &Dependencies, _: &PossibleDependencies<'_>) -> Result<NeedsRand> {
    Ok(NeedsRand {
        rand: deps.get("rand")?,
    })
}

/// Use an undeclared dependency.
pub fn a_baz(deps: &Dependencies, _: &PossibleDependencies<'_>) -> Result<Arc<String>> {
    deps.get("bar")
}

pub fn robin(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<()> {
    Ok(())
}

pub fn tuck(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<()> {
    Ok(())
}

/// Display things on the terminal.
pub fn a_print(_: &Dependencies, _: &PossibleDependencies<'_>) -> Result<Printer> {
    Ok(Printer::new(|line| println!("{line}")))
}

fn names(deps: &Dependencies) -> String {
    deps.names().collect::<Vec<_>>().join(",")
}

/// Print the arguments.
pub fn show(args: &Arguments, deps: &Dependencies) -> Result<()> {
    let print = deps.get::<Printer>("print")?;
    let lala = args.get_one::<String>("lala").cloned().unwrap_or_default();
    print.print(&format!("{lala} {}", names(deps)));
    Ok(())
}

/// Print 'woo' and then the arguments.
pub fn gowoo(args: &Arguments, deps: &Dependencies) -> Result<()> {
    let print = deps.get::<Printer>("print")?;
    let wooo = args.get_one::<String>("wooo").cloned().unwrap_or_default();
    print.print(&format!("woo {wooo} {}", names(deps)));
    Ok(())
}

pub fn register(commands: &Commands) {
    commands.dependency(DependencySpec::named("foo").requires(["bar"])).unwrap()(a_foo);
    commands.dependency(DependencySpec::new().possibly(["bar"])).unwrap()(foo_2);
    commands.dependency(DependencySpec::named("bar")).unwrap()(a_bar);
    commands.dependency(DependencySpec::new()).unwrap()(rand);
    commands.dependency(DependencySpec::new().requires(["rand"])).unwrap()(needs_rand);
    commands.dependency(DependencySpec::named("baz")).unwrap()(a_baz);
    commands.dependency(DependencySpec::new().requires(["tuck"])).unwrap()(robin);
    commands.dependency(DependencySpec::new().requires(["robin"])).unwrap()(tuck);
    commands.dependency(DependencySpec::named("print")).unwrap()(a_print);

    commands.command(
        CommandSpec::new()
            .requires(["foo", "print"])
            .parser(argparser([argument("lala")])),
    ).unwrap()(show);
    commands.command(
        CommandSpec::new()
            .requires(["bar"])
            .parser(argparser([argument("wooo")])),
    ).unwrap()(gowoo);
}

/// Lines recorded by a capturing printer.
#[derive(Default)]
pub struct Lines(Mutex<Vec<String>>);

impl Lines {
    pub fn push(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A printer that records every line it is given.
pub fn capture() -> (Printer, Arc<Lines>) {
    let lines = Arc::new(Lines::default());
    let sink = Arc::clone(&lines);
    (Printer::new(move |line| sink.push(line)), lines)
}
