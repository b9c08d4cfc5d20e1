//! Error types for compilation and evaluation

use thiserror::Error;

use crate::eval::ControlFlow;
use crate::registry::Arity;
use crate::tree::Target;
use crate::value::Value;

/// Main error type for Thicket operations
#[derive(Error, Debug)]
pub enum ThicketError {
    /// The optimizer rejected the program
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Evaluation failed
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// The node store was misused
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type alias for Thicket operations
pub type Result<T> = std::result::Result<T, ThicketError>;

/// Errors raised by the node store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A child index was outside `0..len`
    #[error("child index {index} out of range for node with {len} children")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Number of children the node has
        len: usize,
    },
}

/// Compile-time errors.
///
/// These halt optimization of the program; no partially optimized tree is
/// returned. Every variant carries the source position of the offending node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A call names a function that is neither a builtin nor a special form
    #[error("Unknown function `{name}` at {target}")]
    UnknownFunction {
        /// The unresolved name
        name: String,
        /// Position of the call
        target: Target,
    },

    /// A call passes the wrong number of arguments
    #[error("`{name}` expects {expected} arguments, got {got} at {target}")]
    ArityMismatch {
        /// The function name
        name: String,
        /// What the function accepts
        expected: Arity,
        /// What the call supplied
        got: usize,
        /// Position of the call
        target: Target,
    },

    /// A pure call with constant arguments failed while being folded
    #[error("{message} (while folding `{name}` at {target})")]
    FoldFailed {
        /// The function being folded
        name: String,
        /// The function's error message
        message: String,
        /// Position of the call
        target: Target,
    },

    /// A function rejected one of its constant arguments at compile time
    #[error("{message} at {target}")]
    InvalidArgument {
        /// The function doing the check
        name: String,
        /// What was wrong
        message: String,
        /// Position of the call
        target: Target,
    },

    /// A special form has a shape that can never execute
    #[error("{message} at {target}")]
    Malformed {
        /// What was wrong
        message: String,
        /// Position of the node
        target: Target,
    },
}

impl CompileError {
    /// The source position this error is reported at.
    pub fn target(&self) -> &Target {
        match self {
            CompileError::UnknownFunction { target, .. }
            | CompileError::ArityMismatch { target, .. }
            | CompileError::FoldFailed { target, .. }
            | CompileError::InvalidArgument { target, .. }
            | CompileError::Malformed { target, .. } => target,
        }
    }
}

/// A value refused to be duplicated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloneError {
    /// A host resource does not support copying
    #[error("value of type `{type_name}` cannot be copied")]
    NotCopyable {
        /// Type of the offending value
        type_name: String,
    },
}

/// Errors raised while evaluating a tree.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A variable was read before being assigned
    #[error("Variable `{name}` is not bound at {target}")]
    UndefinedVariable {
        /// The variable name, including its sigil
        name: String,
        /// Position of the read
        target: Target,
    },

    /// A procedure was called before being defined
    #[error("Unknown procedure `{name}` at {target}")]
    UndefinedProcedure {
        /// The procedure name
        name: String,
        /// Position of the call
        target: Target,
    },

    /// A call names an unknown function
    #[error("Unknown function `{name}` at {target}")]
    UnknownFunction {
        /// The function name
        name: String,
        /// Position of the call
        target: Target,
    },

    /// A value had the wrong type for an operation
    #[error("Type error: {message} at {target}")]
    TypeError {
        /// Description of the mismatch
        message: String,
        /// Position of the node
        target: Target,
    },

    /// A call passed the wrong number of arguments
    #[error("`{name}` expects {expected} arguments, got {got} at {target}")]
    ArityMismatch {
        /// The callee
        name: String,
        /// What the callee accepts
        expected: Arity,
        /// What the call supplied
        got: usize,
        /// Position of the call
        target: Target,
    },

    /// A builtin reported a failure
    #[error("{name}: {message} at {target}")]
    BuiltinError {
        /// The builtin name
        name: String,
        /// The builtin's message
        message: String,
        /// Position of the call
        target: Target,
    },

    /// The call depth limit was exceeded
    #[error("Stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Current depth
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// Evaluation was interrupted through the context's interrupt flag
    #[error("Evaluation interrupted")]
    Interrupted,

    /// Non-local control flow unwinding through the evaluator
    #[error("control flow escaped its construct: {0:?}")]
    ControlFlow(ControlFlow),

    /// An environment could not be cloned
    #[error("Internal error: {0}")]
    Clone(#[from] CloneError),

    /// A broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Whether this error indicates a bug in the runtime rather than in the
    /// user's program.
    pub fn is_internal(&self) -> bool {
        matches!(self, EvalError::Clone(_) | EvalError::Internal(_))
    }
}

/// Get the script-level type name of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Void => "void",
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Int(_) => "int",
        Value::Double(_) => "double",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Closure(_) => "closure",
        Value::Resource(_) => "resource",
    }
}
