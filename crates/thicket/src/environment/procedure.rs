//! User-defined procedures

use std::sync::Arc;

use crate::tree::{ParseTree, Target};
use crate::value::Value;

/// A procedure created by `proc(name, params..., body)`.
///
/// Defaults are evaluated once, when the definition runs.
#[derive(Debug, Clone)]
pub struct Procedure {
    /// Name, including the leading `_`
    pub name: String,

    /// Parameter names, including their `@` sigil
    pub params: Vec<String>,

    /// One default per parameter; `Null` when none was given
    pub defaults: Vec<Value>,

    /// The procedure body
    pub body: Arc<ParseTree>,

    /// Where the procedure was defined
    pub target: Target,
}

impl Procedure {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
