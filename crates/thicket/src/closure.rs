//! Closures: anonymous procedures with a captured environment

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::EvalContext;
use crate::environment::Environment;
use crate::error::{CloneError, EvalError};
use crate::eval;
use crate::tree::{ParseTree, Target};
use crate::value::Value;

/// Name of the variable every invocation binds to the full argument list.
pub const ARGUMENTS_VAR: &str = "@arguments";

/// A closure parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name, including the `@` sigil
    pub name: String,
    /// Bound when the caller supplies no argument
    pub default: Value,
}

impl Param {
    /// A parameter defaulting to `null`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_default(name, Value::Null)
    }

    /// A parameter with an explicit default.
    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }
}

/// An anonymous procedure.
///
/// The environment is copied when the closure is created, so later changes
/// in the creating scope are invisible to it. Each invocation runs against
/// a fresh copy of that captured environment, which is why a closure can
/// be invoked from several threads at once; the lock only guards the
/// moment of copying.
pub struct Closure {
    body: Arc<ParseTree>,
    params: Vec<Param>,
    env: Mutex<Environment>,
    target: Target,
}

impl Closure {
    /// Capture `env` and build a closure.
    ///
    /// # Errors
    ///
    /// Returns `CloneError` if a captured value cannot be copied.
    pub fn new(
        body: impl Into<Arc<ParseTree>>,
        params: Vec<Param>,
        env: &Environment,
        target: Target,
    ) -> Result<Self, CloneError> {
        Ok(Self {
            body: body.into(),
            params,
            env: Mutex::new(env.try_clone()?),
            target,
        })
    }

    /// The closure body.
    pub fn body(&self) -> &ParseTree {
        &self.body
    }

    /// Declared parameter names, in order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Declared parameter defaults, in order.
    pub fn param_defaults(&self) -> Vec<&Value> {
        self.params.iter().map(|p| &p.default).collect()
    }

    /// Where the closure was created.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Copy of the captured environment.
    ///
    /// # Errors
    ///
    /// Returns `CloneError` if a captured value cannot be copied.
    pub fn env(&self) -> Result<Environment, CloneError> {
        self.env.lock().try_clone()
    }

    /// Run `f` against the captured environment itself. Changes are seen by
    /// every later invocation.
    pub fn with_env_mut<R>(&self, f: impl FnOnce(&mut Environment) -> R) -> R {
        f(&mut self.env.lock())
    }

    /// Invoke the closure on behalf of a host.
    ///
    /// A runtime error is handed to the context's reaction hook and then
    /// returned as well.
    pub fn execute(&self, args: &[Value], ctx: &EvalContext) -> Result<Value, EvalError> {
        self.execute_at(args, ctx, 0).inspect_err(|err| ctx.react(err))
    }

    /// Invoke with the caller's call depth, so recursion through closures
    /// counts against the limit.
    #[tracing::instrument(level = "debug", skip_all, fields(params = self.params.len(), args = args.len()))]
    pub(crate) fn execute_at(
        &self,
        args: &[Value],
        ctx: &EvalContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let mut env = self.env.lock().try_clone()?;
        env.set_call_depth(depth);
        env.enter_call(ctx.max_call_depth)?;

        for (i, param) in self.params.iter().enumerate() {
            let value = match args.get(i) {
                Some(arg) => arg.clone(),
                None => param.default.deep_clone()?,
            };
            env.set(param.name.clone(), value);
        }
        env.set(ARGUMENTS_VAR, Value::array(args.to_vec()));

        eval::run_body(&self.body, &mut env, ctx)
    }

    /// The body as source-like text.
    pub fn to_text(&self) -> String {
        self.body.to_text()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.to_text())
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_a_snapshot() {
        let mut env = Environment::new();
        env.set("@x", Value::Int(1));
        let closure = Closure::new(
            ParseTree::variable("@x"),
            vec![],
            &env,
            Target::unknown(),
        )
        .unwrap();
        env.set("@x", Value::Int(2));
        assert_eq!(closure.env().unwrap().get("@x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_with_env_mut_persists() {
        let closure = Closure::new(
            ParseTree::void(),
            vec![Param::new("@a")],
            &Environment::new(),
            Target::unknown(),
        )
        .unwrap();
        closure.with_env_mut(|env| env.set("@y", Value::Int(3)));
        assert!(closure.env().unwrap().contains("@y"));
        assert_eq!(closure.param_names(), vec!["@a"]);
        assert_eq!(closure.param_defaults(), vec![&Value::Null]);
    }

    #[test]
    fn test_to_text() {
        let body = ParseTree::call("msg", vec![ParseTree::variable("@a")]);
        let closure =
            Closure::new(body, vec![], &Environment::new(), Target::unknown()).unwrap();
        assert_eq!(closure.to_text(), "msg(@a)");
    }
}
