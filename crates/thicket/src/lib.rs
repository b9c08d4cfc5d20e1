//! # Thicket
//!
//! The tree core of a small scripting language: the parse tree, the
//! optimizer that rewrites it, and the closure runtime that executes it.
//!
//! A program arrives from the parser as a [`ParseTree`]. The [`Optimizer`]
//! folds constants, eliminates branches with constant conditions, flattens
//! statement sequences and inlines simple procedures, reporting
//! statically-detectable mistakes as [`CompileError`]s. The evaluator then
//! walks the optimized tree against an [`Environment`].
//!
//! ## Architecture
//!
//! - **Node store** ([`tree`]): nodes own their children and memoize facts
//!   about their subtree inline.
//! - **Optimizer** ([`optimize`](mod@optimize)): bottom-up rewriting against a
//!   [`FunctionRegistry`] of builtins.
//! - **Runtime** ([`eval`], [`Environment`], [`Closure`]): closures capture
//!   a copy of their defining environment and run each invocation in a
//!   copy of that.
//!
//! ## Example
//!
//! ```
//! use thicket::{compile_and_run, Environment, EvalContext, ParseTree, Value};
//!
//! let program = ParseTree::call(
//!     "__autoconcat__",
//!     vec![
//!         ParseTree::call("assign", vec![ParseTree::variable("@x"), ParseTree::int(20)]),
//!         ParseTree::call("add", vec![ParseTree::variable("@x"), ParseTree::int(22)]),
//!     ],
//! );
//!
//! let mut env = Environment::new();
//! let value = compile_and_run(program, &mut env, &EvalContext::new()).unwrap();
//! assert_eq!(value, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod closure;
pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod logging;
pub mod optimize;
pub mod registry;
pub mod special;
pub mod tree;
pub mod value;

// Re-export main types
pub use closure::{Closure, Param};
pub use context::EvalContext;
pub use environment::{Environment, Procedure};
pub use error::{
    type_name, CloneError, CompileError, EvalError, Result, ThicketError, TreeError,
};
pub use eval::{compile_and_run, execute, run, ControlFlow, Evaluate};
pub use logging::init_tracing;
pub use optimize::{optimize, OptimizeOptions, Optimizer};
pub use registry::{Arity, BuiltinFn, BuiltinFnPtr, CallSite, DocField, FunctionRegistry};
pub use special::SpecialForm;
pub use tree::{Construct, FactKind, ParseTree, Target};
pub use value::{Resource, Value};

/// Thicket version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
