//! Builtin and procedure calls

use crate::closure::ARGUMENTS_VAR;
use crate::eval::Evaluate;
use crate::registry::CallSite;
use crate::tree::ParseTree;
use crate::{Environment, EvalContext, EvalError, Value};

/// Evaluate every child of `node`, left to right.
pub(super) fn eval_args(
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Vec<Value>, EvalError> {
    node.children()
        .iter()
        .map(|child| child.eval(env, ctx))
        .collect()
}

/// Call a registered builtin.
pub(super) fn call_builtin(
    name: &str,
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let builtin = ctx
        .registry
        .get(name)
        .ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
            target: node.target().clone(),
        })?;

    let args = eval_args(node, env, ctx)?;

    if !builtin.arity.accepts(args.len()) {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected: builtin.arity,
            got: args.len(),
            target: node.target().clone(),
        });
    }

    let site = CallSite {
        target: node.target(),
        env: Some(&*env),
        registry: &ctx.registry,
    };
    builtin
        .call(&args, &site)
        .map_err(|message| EvalError::BuiltinError {
            name: name.to_string(),
            message,
            target: node.target().clone(),
        })
}

/// Call a user procedure.
///
/// The body runs in a fresh variable scope that still sees the caller's
/// procedures. Missing arguments take the declared default; every argument
/// is also available as `@arguments`.
#[tracing::instrument(level = "debug", skip_all, fields(name = %name))]
pub(super) fn call_procedure(
    name: &str,
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let procedure = env
        .procedure(name)
        .cloned()
        .ok_or_else(|| EvalError::UndefinedProcedure {
            name: name.to_string(),
            target: node.target().clone(),
        })?;

    let args = eval_args(node, env, ctx)?;

    let mut scope = env.procedure_scope();
    scope.enter_call(ctx.max_call_depth)?;

    for (i, (param, default)) in procedure.params.iter().zip(&procedure.defaults).enumerate() {
        let value = match args.get(i) {
            Some(arg) => arg.clone(),
            None => default.deep_clone()?,
        };
        scope.set(param.clone(), value);
    }
    scope.set(ARGUMENTS_VAR, Value::array(args));

    super::run_body(&procedure.body, &mut scope, ctx)
}
