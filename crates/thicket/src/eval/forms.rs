//! Special form evaluation

use std::sync::Arc;

use crate::closure::{Closure, Param};
use crate::environment::Procedure;
use crate::eval::{ControlFlow, Evaluate};
use crate::special::{self, SpecialForm};
use crate::tree::{Construct, ParseTree};
use crate::{Environment, EvalContext, EvalError, Value};

pub(super) fn eval_special(
    form: SpecialForm,
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let children = node.children();
    if !form.arity().accepts(children.len()) {
        return Err(EvalError::ArityMismatch {
            name: form.name().to_string(),
            expected: form.arity(),
            got: children.len(),
            target: node.target().clone(),
        });
    }

    match form {
        SpecialForm::AutoConcat | SpecialForm::Sequence => eval_sequence(children, env, ctx),
        SpecialForm::If => eval_if(children, env, ctx),
        SpecialForm::IfElse => eval_ifelse(children, env, ctx),
        SpecialForm::Proc => eval_proc(node, env, ctx),
        SpecialForm::Assign => eval_assign(node, env, ctx),
        SpecialForm::Return => {
            let value = match children.first() {
                Some(child) => child.eval(env, ctx)?,
                None => Value::Void,
            };
            Err(EvalError::ControlFlow(ControlFlow::return_with(value)))
        }
        SpecialForm::Closure => eval_closure(node, env, ctx),
        SpecialForm::Execute => eval_execute(node, env, ctx),
    }
}

fn eval_sequence(
    children: &[ParseTree],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut last = Value::Void;
    for child in children {
        last = child.eval(env, ctx)?;
    }
    Ok(last)
}

fn eval_if(
    children: &[ParseTree],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if children[0].eval(env, ctx)?.is_truthy() {
        children[1].eval(env, ctx)
    } else {
        match children.get(2) {
            Some(otherwise) => otherwise.eval(env, ctx),
            None => Ok(Value::Void),
        }
    }
}

fn eval_ifelse(
    children: &[ParseTree],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut pairs = children.chunks_exact(2);
    for pair in pairs.by_ref() {
        if pair[0].eval(env, ctx)?.is_truthy() {
            return pair[1].eval(env, ctx);
        }
    }
    match pairs.remainder().first() {
        Some(otherwise) => otherwise.eval(env, ctx),
        None => Ok(Value::Void),
    }
}

fn eval_assign(
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let name = match node.children()[0].data() {
        Construct::Variable(name) => name.clone(),
        other => {
            return Err(EvalError::TypeError {
                message: format!("assign expects a variable, found {}", other),
                target: node.target().clone(),
            })
        }
    };
    let value = node.children()[1].eval(env, ctx)?;
    env.set(name, value.clone());
    Ok(value)
}

/// Evaluate `params` into names and defaults, in order.
fn eval_params(
    params: &[ParseTree],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Vec<Param>, EvalError> {
    params
        .iter()
        .map(|node| -> Result<Param, EvalError> {
            let (name, default) = special::parameter(node).ok_or_else(|| EvalError::TypeError {
                message: format!("`{}` is not a valid parameter", node.to_text()),
                target: node.target().clone(),
            })?;
            let default = match default {
                Some(expr) => expr.eval(env, ctx)?,
                None => Value::Null,
            };
            Ok(Param::with_default(name, default))
        })
        .collect()
}

/// Split `children` into parameter nodes and the body (the last child).
fn params_and_body(children: &[ParseTree]) -> (&[ParseTree], ParseTree) {
    match children.split_last() {
        Some((body, params)) => (params, body.clone()),
        None => (children, ParseTree::void()),
    }
}

fn eval_proc(
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let children = node.children();
    let name = special::procedure_name(&children[0])
        .filter(|name| name.starts_with('_'))
        .ok_or_else(|| EvalError::TypeError {
            message: format!(
                "procedure names must start with an underscore, found `{}`",
                children[0].to_text()
            ),
            target: node.target().clone(),
        })?
        .to_string();

    let (param_nodes, body) = params_and_body(&children[1..]);
    let params = eval_params(param_nodes, env, ctx)?;

    let (params, defaults): (Vec<String>, Vec<Value>) =
        params.into_iter().map(|p| (p.name, p.default)).unzip();
    tracing::debug!(name = %name, "defining procedure");
    env.define_procedure(Procedure {
        name,
        params,
        defaults,
        body: Arc::new(body),
        target: node.target().clone(),
    });
    Ok(Value::Void)
}

fn eval_closure(
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let (param_nodes, body) = params_and_body(node.children());
    let params = eval_params(param_nodes, env, ctx)?;
    let closure = Closure::new(body, params, env, node.target().clone())?;
    Ok(Value::closure(closure))
}

fn eval_execute(
    node: &ParseTree,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut args = super::call::eval_args(node, env, ctx)?;
    let callee = args.pop().unwrap_or(Value::Void);
    let closure = callee.as_closure().ok_or_else(|| EvalError::TypeError {
        message: format!(
            "execute expects a closure as its last argument, found {}",
            callee.type_name()
        ),
        target: node.target().clone(),
    })?;
    closure.execute_at(&args, ctx, env.call_depth())
}
