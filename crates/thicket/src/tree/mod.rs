//! The parse tree: one payload per node plus ordered children
//!
//! A [`ParseTree`] is produced by the parser, rewritten by the
//! [`Optimizer`](crate::Optimizer) and walked by the evaluator. Each node owns
//! its children outright; nothing is shared between trees.

mod cache;
mod render;
mod target;

pub use cache::FactKind;
pub use render::escape_string;
pub use target::Target;

use std::fmt;

use indexmap::IndexSet;

use crate::error::TreeError;
use crate::special::SpecialForm;
use crate::value::Value;
use cache::DerivedFacts;

/// The payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Construct {
    /// A value known at parse time: `'hi'`, `4`, `true`, `null`
    Literal(Value),

    /// A variable read, sigil included: `@name`
    Variable(String),

    /// A call; the node's children are the arguments. Names starting with
    /// `_` call user procedures.
    Function(String),
}

impl Construct {
    /// Whether this payload's value depends on runtime state.
    ///
    /// Literals are constant; variable reads and calls are dynamic. This is
    /// a property of the payload alone and never looks at children.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Construct::Literal(_))
    }

    /// The called name, for `Function` payloads.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Construct::Function(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construct::Literal(value) => write!(f, "{}", value),
            Construct::Variable(name) | Construct::Function(name) => f.write_str(name),
        }
    }
}

/// A node in the parse tree.
///
/// Besides its payload and children, a node remembers whether the optimizer
/// has already settled it, and memoizes facts about its subtree (see
/// [`callable_symbols`](Self::callable_symbols)). Every `&mut` accessor
/// clears that memo, and reaching a descendant mutably means going through
/// each ancestor's `&mut` accessors, so a memo never describes a stale
/// subtree.
pub struct ParseTree {
    data: Construct,
    target: Target,
    children: Vec<ParseTree>,
    optimized: bool,
    facts: DerivedFacts,
}

impl Default for ParseTree {
    /// An empty builder node holding `null`.
    fn default() -> Self {
        Self::new(Construct::Literal(Value::Null))
    }
}

impl Clone for ParseTree {
    /// Deep copy: the payload and every descendant are copied. The copy
    /// starts with an empty memo.
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            target: self.target.clone(),
            children: self.children.clone(),
            optimized: self.optimized,
            facts: DerivedFacts::default(),
        }
    }
}

impl PartialEq for ParseTree {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.target == other.target
            && self.optimized == other.optimized
            && self.children == other.children
    }
}

impl fmt::Debug for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseTree")
            .field("data", &self.data)
            .field("target", &self.target)
            .field("optimized", &self.optimized)
            .field("children", &self.children)
            .finish()
    }
}

impl ParseTree {
    // ═══════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════

    /// Create a childless node at an unknown position.
    pub fn new(data: Construct) -> Self {
        Self::with_target(data, Target::unknown())
    }

    /// Create a childless node at a source position.
    pub fn with_target(data: Construct, target: Target) -> Self {
        Self {
            data,
            target,
            children: Vec::new(),
            optimized: false,
            facts: DerivedFacts::default(),
        }
    }

    /// Set the source position (builder style).
    pub fn at(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// A literal node.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(Construct::Literal(value.into()))
    }

    /// A string literal node.
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::literal(Value::string(s))
    }

    /// An integer literal node.
    pub fn int(n: i64) -> Self {
        Self::literal(Value::Int(n))
    }

    /// A boolean literal node.
    pub fn boolean(b: bool) -> Self {
        Self::literal(Value::Bool(b))
    }

    /// A `null` literal node.
    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    /// A `void` literal node.
    pub fn void() -> Self {
        Self::literal(Value::Void)
    }

    /// A variable node; `name` includes the `@` sigil.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(Construct::Variable(name.into()))
    }

    /// A call node with the given arguments.
    pub fn call(name: impl Into<String>, args: Vec<ParseTree>) -> Self {
        let mut node = Self::new(Construct::Function(name.into()));
        node.children = args;
        node
    }

    /// A bare identifier (a call node without arguments), as the parser
    /// produces for procedure names.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::call(name, Vec::new())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Payload and Flags
    // ═══════════════════════════════════════════════════════════════════

    /// The node's payload.
    pub fn data(&self) -> &Construct {
        &self.data
    }

    /// Replace the payload.
    pub fn set_data(&mut self, data: Construct) {
        self.facts.clear();
        self.data = data;
    }

    /// Where the node came from.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether the optimizer has settled this node.
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Mark the node as settled (or not).
    pub fn set_optimized(&mut self, optimized: bool) {
        self.optimized = optimized;
    }

    /// The called name, if this is a call node.
    pub fn function_name(&self) -> Option<&str> {
        self.data.function_name()
    }

    /// The special form this node invokes, if any.
    pub fn special_form(&self) -> Option<SpecialForm> {
        self.function_name().and_then(SpecialForm::from_name)
    }

    /// The literal value, if this is a literal node.
    pub fn value(&self) -> Option<&Value> {
        match &self.data {
            Construct::Literal(value) => Some(value),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Children
    // ═══════════════════════════════════════════════════════════════════

    /// The direct children, in order.
    pub fn children(&self) -> &[ParseTree] {
        &self.children
    }

    /// Mutable access to the child list.
    pub fn children_mut(&mut self) -> &mut Vec<ParseTree> {
        self.facts.clear();
        &mut self.children
    }

    /// The child at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if there is no such child.
    pub fn child(&self, index: usize) -> Result<&ParseTree, TreeError> {
        let len = self.children.len();
        self.children
            .get(index)
            .ok_or(TreeError::IndexOutOfBounds { index, len })
    }

    /// Mutable access to the child at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if there is no such child.
    pub fn child_mut(&mut self, index: usize) -> Result<&mut ParseTree, TreeError> {
        self.facts.clear();
        let len = self.children.len();
        self.children
            .get_mut(index)
            .ok_or(TreeError::IndexOutOfBounds { index, len })
    }

    /// Append a child.
    pub fn add_child(&mut self, node: ParseTree) {
        self.facts.clear();
        self.children.push(node);
    }

    /// Insert a child before `index` (`index == len` appends).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index > len`.
    pub fn add_child_at(&mut self, index: usize, node: ParseTree) -> Result<(), TreeError> {
        let len = self.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        self.facts.clear();
        self.children.insert(index, node);
        Ok(())
    }

    /// Remove and return the child at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if there is no such child.
    pub fn remove_child_at(&mut self, index: usize) -> Result<ParseTree, TreeError> {
        let len = self.children.len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        self.facts.clear();
        Ok(self.children.remove(index))
    }

    /// Remove every child.
    pub fn remove_all_children(&mut self) {
        self.facts.clear();
        self.children.clear();
    }

    /// Replace the child list.
    pub fn set_children(&mut self, children: Vec<ParseTree>) {
        self.facts.clear();
        self.children = children;
    }

    /// Detach and return the child list, leaving the node childless.
    pub fn take_children(&mut self) -> Vec<ParseTree> {
        self.facts.clear();
        std::mem::take(&mut self.children)
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether the node has any children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Subtree Queries
    // ═══════════════════════════════════════════════════════════════════

    /// This node's payload followed by every descendant's, in pre-order.
    pub fn all_data(&self) -> Vec<&Construct> {
        let mut out = Vec::new();
        self.collect_data(&mut out);
        out
    }

    fn collect_data<'a>(&'a self, out: &mut Vec<&'a Construct>) {
        out.push(&self.data);
        for child in &self.children {
            child.collect_data(out);
        }
    }

    /// Distinct names called anywhere in this subtree, in first-seen order.
    ///
    /// Memoized on the node. The returned vector is the caller's own copy.
    pub fn callable_symbols(&self) -> Vec<String> {
        self.facts
            .get_or_compute(FactKind::Functions, || {
                self.distinct(|data| match data {
                    Construct::Function(name) => Some(name),
                    _ => None,
                })
            })
            .to_vec()
    }

    /// Distinct variable names read anywhere in this subtree, in first-seen
    /// order. Memoized like [`callable_symbols`](Self::callable_symbols).
    pub fn referenced_variables(&self) -> Vec<String> {
        self.facts
            .get_or_compute(FactKind::Variables, || {
                self.distinct(|data| match data {
                    Construct::Variable(name) => Some(name),
                    _ => None,
                })
            })
            .to_vec()
    }

    /// Whether a fact is currently memoized on this node.
    pub fn is_cached(&self, kind: FactKind) -> bool {
        self.facts.is_cached(kind)
    }

    fn distinct<'a>(&'a self, pick: impl Fn(&'a Construct) -> Option<&'a String>) -> Vec<String> {
        self.all_data()
            .into_iter()
            .filter_map(pick)
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether the node's value is fixed regardless of execution context.
    pub fn is_const(&self) -> bool {
        !self.data.is_dynamic()
    }

    /// Whether the node's value depends on runtime state.
    pub fn is_dynamic(&self) -> bool {
        self.data.is_dynamic()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copying
    // ═══════════════════════════════════════════════════════════════════

    /// Deep copy with every `optimized` flag cleared, ready to be fed back
    /// through the optimizer.
    pub fn fresh_copy(&self) -> ParseTree {
        ParseTree {
            data: self.data.clone(),
            target: self.target.clone(),
            children: self.children.iter().map(ParseTree::fresh_copy).collect(),
            optimized: false,
            facts: DerivedFacts::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════

    /// Render the subtree as source-like text.
    ///
    /// Calls render as `name(arg,arg)`, except `__autoconcat__`, whose
    /// children are written back to back. String literals are quoted with
    /// `'` and escaped by [`escape_string`]; everything else uses the
    /// payload's own text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        render::render(self, &mut out);
        out
    }

    /// `data:[child, child]`, one level deep. For debugging.
    pub fn to_verbose_string(&self) -> String {
        let children: Vec<String> = self.children.iter().map(|c| c.data.to_string()).collect();
        format!("{}:[{}]", self.data, children.join(", "))
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
