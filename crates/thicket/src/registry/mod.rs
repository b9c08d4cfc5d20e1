//! Builtin functions and the registry the optimizer and evaluator consult

mod prelude;
mod reflection;

pub use reflection::DocField;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::environment::Environment;
use crate::tree::{ParseTree, Target};
use crate::value::Value;

/// Type alias for builtin function pointers to reduce complexity
pub type BuiltinFnPtr = Arc<dyn Fn(&[Value], &CallSite<'_>) -> Result<Value, String> + Send + Sync>;

/// Compile-time argument check: receives the optimized argument subtrees.
pub type StaticCheckFn =
    Arc<dyn Fn(&[ParseTree], &FunctionRegistry) -> Result<(), String> + Send + Sync>;

/// Decides from the optimized argument subtrees whether an impure builtin
/// may still be folded at this call.
pub type FoldWhenFn = Arc<dyn Fn(&[ParseTree]) -> bool + Send + Sync>;

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many
    Exact(usize),
    /// This many or more
    AtLeast(usize),
    /// Between the bounds, inclusive
    Range(usize, usize),
}

impl Arity {
    /// Whether `count` arguments are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Range(lo, hi) => write!(f, "between {} and {}", lo, hi),
        }
    }
}

/// What a builtin can see about the call it is servicing.
///
/// `env` is `None` while the optimizer folds a pure call at compile time.
pub struct CallSite<'a> {
    /// Position of the call
    pub target: &'a Target,
    /// The calling environment, when running
    pub env: Option<&'a Environment>,
    /// The registry the call was resolved through
    pub registry: &'a FunctionRegistry,
}

impl<'a> CallSite<'a> {
    /// The calling environment, or an error when called at compile time.
    pub fn env(&self) -> Result<&'a Environment, String> {
        self.env
            .ok_or_else(|| "this function needs a runtime environment".to_string())
    }
}

/// A built-in native function.
///
/// These are Rust functions exposed to scripts.
#[derive(Clone)]
pub struct BuiltinFn {
    /// Function name (for display/debugging)
    pub name: String,

    /// Accepted argument counts
    pub arity: Arity,

    /// Whether the result depends only on the arguments and calling it has
    /// no observable effect. Pure calls with constant arguments are folded.
    pub pure: bool,

    /// Documentation in `returnType {args} description` form
    pub docs: String,

    /// The actual function pointer
    pub func: BuiltinFnPtr,

    /// Optional compile-time validation of constant arguments
    pub static_check: Option<StaticCheckFn>,

    /// Lets an impure builtin fold the calls that cannot observe runtime
    /// state. Only consulted when every argument is a literal.
    pub fold_when: Option<FoldWhenFn>,
}

impl BuiltinFn {
    /// Create an impure builtin without docs.
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&[Value], &CallSite<'_>) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            pure: false,
            docs: String::new(),
            func: Arc::new(func),
            static_check: None,
            fold_when: None,
        }
    }

    /// Mark the function pure (builder style).
    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    /// Attach documentation (builder style).
    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = docs.into();
        self
    }

    /// Attach a compile-time argument check (builder style).
    pub fn with_static_check(
        mut self,
        check: impl Fn(&[ParseTree], &FunctionRegistry) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.static_check = Some(Arc::new(check));
        self
    }

    /// Allow folding of the calls `when` accepts (builder style).
    pub fn with_fold_when(
        mut self,
        when: impl Fn(&[ParseTree]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fold_when = Some(Arc::new(when));
        self
    }

    /// Whether a call with these literal arguments may be folded.
    pub fn is_foldable(&self, args: &[ParseTree]) -> bool {
        self.pure || self.fold_when.as_ref().is_some_and(|when| when(args))
    }

    /// Invoke the function.
    pub fn call(&self, args: &[Value], site: &CallSite<'_>) -> Result<Value, String> {
        (self.func)(args, site)
    }
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFn({})", self.name)
    }
}

/// Name → builtin table.
///
/// Shared between compilation units and running scripts; lookups and
/// registrations may happen concurrently.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: DashMap<String, Arc<BuiltinFn>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builtin, replacing any previous one with the same name.
    pub fn register(&self, builtin: BuiltinFn) {
        tracing::trace!(name = %builtin.name, pure = builtin.pure, "registering builtin");
        self.functions
            .insert(builtin.name.clone(), Arc::new(builtin));
    }

    /// Look up a builtin by name.
    pub fn get(&self, name: &str) -> Option<Arc<BuiltinFn>> {
        self.functions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a builtin with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Whether `name` is a registered pure builtin.
    pub fn is_pure(&self, name: &str) -> bool {
        self.functions.get(name).is_some_and(|entry| entry.pure)
    }

    /// Documentation for a builtin or special form.
    pub fn docs(&self, name: &str) -> Option<String> {
        if let Some(form) = crate::special::SpecialForm::from_name(name) {
            return Some(form.docs().to_string());
        }
        self.functions.get(name).map(|entry| entry.docs.clone())
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered builtins.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no builtins are registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
