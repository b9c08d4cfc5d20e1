//! Runtime environment: variables, procedures and script metadata

mod procedure;

pub use procedure::Procedure;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{CloneError, EvalError};
use crate::value::Value;

/// Where `msg` and friends write their text.
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The mutable state a script runs against.
///
/// Variables and procedures live in flat, insertion-ordered maps; a
/// procedure call gets a fresh variable map via
/// [`procedure_scope`](Self::procedure_scope) rather than pushing a frame.
/// An environment is not `Clone`: copying one means copying
/// every value, which can fail, so use [`try_clone`](Self::try_clone).
///
/// # Example
///
/// ```
/// use thicket::{Environment, Value};
///
/// let mut env = Environment::new().with_label("admin");
/// env.set("@x", Value::Int(1));
///
/// let copy = env.try_clone().unwrap();
/// env.set("@x", Value::Int(2));
///
/// assert_eq!(copy.get("@x"), Some(&Value::Int(1)));
/// assert_eq!(copy.label(), Some("admin"));
/// ```
pub struct Environment {
    variables: IndexMap<String, Value>,
    procedures: IndexMap<String, Arc<Procedure>>,
    label: Option<String>,
    command: Option<String>,
    script: Option<String>,
    output: OutputSink,
    call_depth: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
            procedures: IndexMap::new(),
            label: None,
            command: None,
            script: None,
            output: Arc::new(|text| println!("{}", text)),
            call_depth: 0,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("variables", &self.variables)
            .field("procedures", &self.procedures.keys().collect::<Vec<_>>())
            .field("label", &self.label)
            .field("command", &self.command)
            .field("script", &self.script)
            .field("call_depth", &self.call_depth)
            .finish()
    }
}

impl Environment {
    /// Create a new empty environment that prints to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission label the script runs under (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the command that triggered the script (builder style).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the script's name (builder style).
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Redirect output (builder style).
    pub fn with_output(mut self, output: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.output = Arc::new(output);
        self
    }

    /// The permission label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The triggering command, if any.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// The script name, if any.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Write a line of text to the output sink.
    pub fn emit(&self, text: &str) {
        (self.output)(text);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════

    /// Look up a variable; `name` includes its `@` sigil.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Bind or rebind a variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Check if a variable is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Unbind a variable, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.shift_remove(name)
    }

    /// Bound variable names in binding order.
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variables are bound.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Unbind every variable. Procedures are kept.
    pub fn clear(&mut self) {
        self.variables.clear();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Procedures
    // ═══════════════════════════════════════════════════════════════════

    /// Define or redefine a procedure.
    pub fn define_procedure(&mut self, procedure: Procedure) {
        self.procedures
            .insert(procedure.name.clone(), Arc::new(procedure));
    }

    /// Look up a procedure by name (including its `_`).
    pub fn procedure(&self, name: &str) -> Option<&Arc<Procedure>> {
        self.procedures.get(name)
    }

    /// All defined procedures, in definition order.
    pub fn procedures(&self) -> impl Iterator<Item = &Arc<Procedure>> {
        self.procedures.values()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copying and Scoping
    // ═══════════════════════════════════════════════════════════════════

    /// Copy the environment, deep-copying every variable's value.
    ///
    /// Procedures and the output sink are shared with the original.
    ///
    /// # Errors
    ///
    /// Returns `CloneError` if some value refuses to be copied.
    pub fn try_clone(&self) -> Result<Self, CloneError> {
        let variables = self
            .variables
            .iter()
            .map(|(name, value)| Ok((name.clone(), value.deep_clone()?)))
            .collect::<Result<IndexMap<_, _>, CloneError>>()?;
        Ok(Self {
            variables,
            procedures: self.procedures.clone(),
            label: self.label.clone(),
            command: self.command.clone(),
            script: self.script.clone(),
            output: Arc::clone(&self.output),
            call_depth: self.call_depth,
        })
    }

    /// The environment a procedure body runs in: no variables, the
    /// caller's procedures and metadata.
    pub fn procedure_scope(&self) -> Self {
        Self {
            variables: IndexMap::new(),
            procedures: self.procedures.clone(),
            label: self.label.clone(),
            command: self.command.clone(),
            script: self.script.clone(),
            output: Arc::clone(&self.output),
            call_depth: self.call_depth,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Depth Tracking
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a call. Returns error if `max_depth` would be exceeded.
    pub fn enter_call(&mut self, max_depth: usize) -> Result<(), EvalError> {
        if self.call_depth >= max_depth {
            return Err(EvalError::StackOverflow {
                depth: self.call_depth + 1,
                max: max_depth,
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Exit a call.
    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Get current call depth.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub(crate) fn set_call_depth(&mut self, depth: usize) {
        self.call_depth = depth;
    }
}
