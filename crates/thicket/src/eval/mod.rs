//! Tree evaluation

mod call;
mod control;
mod forms;

pub use control::ControlFlow;

use crate::error::ThicketError;
use crate::optimize::optimize;
use crate::tree::{Construct, ParseTree};
use crate::{Environment, EvalContext, EvalError, Value};

/// Trait for evaluating tree nodes to values.
///
/// This is the core abstraction for the tree-walking interpreter.
pub trait Evaluate {
    /// Evaluate this node in the given environment.
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Node Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ParseTree {
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
        // Check for interruption before each node
        if ctx.is_interrupted() {
            return Err(EvalError::Interrupted);
        }
        if ctx.trace {
            tracing::trace!(node = %self.data(), target = %self.target(), "eval");
        }

        match self.data() {
            Construct::Literal(value) => Ok(value.clone()),

            Construct::Variable(name) => {
                env.get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable {
                        name: name.clone(),
                        target: self.target().clone(),
                    })
            }

            Construct::Function(name) => match self.special_form() {
                Some(form) => forms::eval_special(form, self, env, ctx),
                None if name.starts_with('_') => call::call_procedure(name, self, env, ctx),
                None => call::call_builtin(name, self, env, ctx),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Entry Points
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate a subtree, yielding its value.
///
/// A `return` that reaches this level ends execution with its value.
pub fn execute(
    tree: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match tree.eval(env, ctx) {
        Err(EvalError::ControlFlow(ControlFlow::Return { value })) => Ok(value),
        other => other,
    }
}

/// Like [`execute`], but an escaping runtime error is first handed to the
/// context's reaction hook.
pub fn run(tree: &ParseTree, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    execute(tree, env, ctx).inspect_err(|err| ctx.react(err))
}

/// Optimize `tree` against the context's registry, then [`run`] it.
pub fn compile_and_run(
    tree: ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, ThicketError> {
    let optimized = optimize(tree, &ctx.registry)?;
    Ok(run(&optimized, env, ctx)?)
}

/// Run a procedure or closure body: the result is the `return`ed value, or
/// void when the body finishes without returning.
pub(crate) fn run_body(
    body: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match body.eval(env, ctx) {
        Ok(_) => Ok(Value::Void),
        Err(EvalError::ControlFlow(ControlFlow::Return { value })) => Ok(value),
        Err(err) => Err(err),
    }
}
