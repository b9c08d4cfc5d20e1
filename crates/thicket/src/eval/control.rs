//! Control flow mechanism for return

use crate::Value;

/// Control flow signal for non-local jumps.
///
/// When `return` is evaluated, it doesn't produce a normal
/// `Result<Value, EvalError>`. Instead, it returns an
/// `Err(EvalError::ControlFlow(...))` that propagates up until caught by the
/// enclosing procedure, closure, or top-level execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Return from a procedure or closure with a value.
    Return {
        /// Value to return
        value: Value,
    },
}

impl ControlFlow {
    /// Create a return with a value.
    pub fn return_with(value: Value) -> Self {
        ControlFlow::Return { value }
    }
}
