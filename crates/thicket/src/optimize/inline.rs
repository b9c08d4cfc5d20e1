//! Procedure definitions and call-site inlining
//!
//! The optimizer tracks which procedure definitions are certain to be in
//! effect at each point of the program. Definitions live in a stack of
//! frames that mirrors how procedures are scoped at runtime:
//!
//! - a statement sequence pushes a [`FrameKind::Sequence`] frame, and a
//!   `proc` that is a direct statement of it is visible to the statements
//!   that follow;
//! - a procedure body pushes a [`FrameKind::Procedure`] frame, a barrier
//!   that lookups and definitions never cross, because the body runs
//!   against whatever procedures its caller has;
//! - a closure pushes a [`FrameKind::Closure`] frame, which lookups pass
//!   through (the closure captures its creator's procedures) but
//!   definitions do not escape.
//!
//! Any definition also marks its name as opaque in the enclosing frames up
//! to the nearest barrier, so a procedure that is only conditionally
//! (re)defined blocks inlining from then on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{check_arity, Optimizer};
use crate::error::CompileError;
use crate::special::{self, SpecialForm};
use crate::tree::{Construct, ParseTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FrameKind {
    Sequence,
    Procedure,
    Closure,
}

/// Where a `proc` appears relative to the innermost sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Placement {
    /// A direct statement of the sequence being visited
    Sequence,
    /// Anywhere else (a branch, an argument, the program root)
    Nested,
}

/// A procedure whose calls can be replaced by its returned expression.
#[derive(Debug)]
struct Template {
    params: Vec<String>,
    defaults: Vec<Option<ParseTree>>,
    /// Parameters the body reads on every evaluation
    strict: HashSet<String>,
    body: ParseTree,
}

#[derive(Debug, Clone)]
enum Definition {
    Inlinable(Arc<Template>),
    Opaque,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    definitions: HashMap<String, Definition>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            definitions: HashMap::new(),
        }
    }
}

/// The definition frames of one optimization pass.
#[derive(Debug)]
pub(super) struct Scopes {
    frames: Vec<Frame>,
}

impl Scopes {
    /// A stack holding only the program's root frame.
    pub(super) fn new() -> Self {
        Self {
            frames: vec![Frame::new(FrameKind::Procedure)],
        }
    }

    pub(super) fn push(&mut self, kind: FrameKind) {
        self.frames.push(Frame::new(kind));
    }

    /// Pop the innermost frame. The root frame is never popped.
    pub(super) fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn lookup(&self, name: &str) -> Option<&Definition> {
        for frame in self.frames.iter().rev() {
            if let Some(definition) = frame.definitions.get(name) {
                return Some(definition);
            }
            if frame.kind == FrameKind::Procedure {
                break;
            }
        }
        None
    }

    fn define(&mut self, name: &str, definition: Definition, placement: Placement) {
        let shadow_below = match placement {
            Placement::Sequence => {
                if let Some(top) = self.frames.last_mut() {
                    top.definitions.insert(name.to_string(), definition);
                }
                self.frames.len().saturating_sub(1)
            }
            Placement::Nested => self.frames.len(),
        };
        for frame in self.frames[..shadow_below].iter_mut().rev() {
            frame
                .definitions
                .insert(name.to_string(), Definition::Opaque);
            if frame.kind != FrameKind::Sequence {
                break;
            }
        }
    }

    /// Mark every procedure defined anywhere in `node` as opaque.
    pub(super) fn shadow_definitions_in(&mut self, node: &ParseTree) {
        if node.special_form() == Some(SpecialForm::Proc) {
            if let Some(name) = node.children().first().and_then(special::procedure_name) {
                self.define(name, Definition::Opaque, Placement::Nested);
            }
        }
        for child in node.children() {
            self.shadow_definitions_in(child);
        }
    }
}

impl Optimizer<'_> {
    /// Optimize a `proc` definition and record it.
    ///
    /// The name is normalized to a string literal. Parameter defaults are
    /// optimized in the defining scope; the body in a fresh barrier frame.
    pub(super) fn visit_proc(
        &mut self,
        mut node: ParseTree,
        placement: Placement,
    ) -> Result<ParseTree, CompileError> {
        if !node.is_optimized() {
            check_arity("proc", SpecialForm::Proc.arity(), &node)?;
            let mut parts = node.take_children();
            let body = if parts.len() > 1 { parts.pop() } else { None };
            let mut parts = parts.into_iter();
            let mut children = Vec::with_capacity(parts.len() + 1);

            if let Some(name_node) = parts.next() {
                children.push(normalize_name(&name_node)?);
            }
            for param in parts {
                if special::parameter(&param).is_none() {
                    return Err(CompileError::Malformed {
                        message: format!("`{}` is not a valid parameter", param.to_text()),
                        target: param.target().clone(),
                    });
                }
                children.push(self.visit(param)?);
            }
            if let Some(body) = body {
                self.scopes.push(FrameKind::Procedure);
                let body = self.visit(body);
                self.scopes.pop();
                children.push(body?);
            }

            node.set_children(children);
            node.set_optimized(true);
        }

        if let Some(name) = node.children().first().and_then(special::procedure_name) {
            let definition = self.analyze(name, &node);
            self.scopes.define(name, definition, placement);
        }
        Ok(node)
    }

    /// Decide whether calls to an optimized `proc` may be inlined.
    fn analyze(&self, name: &str, node: &ParseTree) -> Definition {
        let Some((body, params)) = node.children().get(1..).and_then(<[_]>::split_last) else {
            return Definition::Opaque;
        };
        let Some(expr) = returned_expression(body) else {
            return Definition::Opaque;
        };
        if body.callable_symbols().iter().any(|called| called == name) {
            tracing::trace!(procedure = name, "not inlining recursive procedure");
            return Definition::Opaque;
        }

        let mut names = Vec::with_capacity(params.len());
        let mut defaults = Vec::with_capacity(params.len());
        for param in params {
            let Some((param_name, default)) = special::parameter(param) else {
                return Definition::Opaque;
            };
            if default.is_some_and(ParseTree::is_dynamic) {
                return Definition::Opaque;
            }
            names.push(param_name.to_string());
            defaults.push(default.cloned());
        }

        if !expr
            .referenced_variables()
            .iter()
            .all(|variable| names.contains(variable))
        {
            return Definition::Opaque;
        }
        if !self.is_side_effect_free(expr) {
            tracing::trace!(procedure = name, "not inlining procedure with side effects");
            return Definition::Opaque;
        }

        let mut strict = HashSet::new();
        unconditional_reads(expr, &mut strict);
        Definition::Inlinable(Arc::new(Template {
            params: names,
            defaults,
            strict,
            body: expr.fresh_copy(),
        }))
    }

    /// Replace a procedure call with the procedure's returned expression
    /// when that is certain to mean the same thing.
    pub(super) fn inline_call(&mut self, name: &str, node: ParseTree) -> Result<ParseTree, CompileError> {
        if !self.options.inline_procedures {
            return Ok(node);
        }
        let template = match self.scopes.lookup(name) {
            Some(Definition::Inlinable(template)) => Arc::clone(template),
            _ => return Ok(node),
        };

        let args = node.children();
        if args.len() > template.params.len()
            || !args.iter().all(|arg| self.is_side_effect_free(arg))
        {
            return Ok(node);
        }
        // Every dynamic argument must be read on each path through the body.
        if let Some(i) = args
            .iter()
            .zip(&template.params)
            .position(|(arg, param)| !arg.is_const() && !template.strict.contains(param))
        {
            tracing::trace!(
                procedure = name,
                param = %template.params[i],
                "not inlining call whose argument may go unevaluated"
            );
            return Ok(node);
        }

        let mut bindings = HashMap::with_capacity(template.params.len());
        for (i, (param, default)) in template.params.iter().zip(&template.defaults).enumerate() {
            let value = match (args.get(i), default) {
                (Some(arg), _) => arg.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) => return Ok(node),
            };
            bindings.insert(param.as_str(), value);
        }

        let inlined = substitute(template.body.fresh_copy(), &bindings).at(node.target().clone());
        tracing::debug!(procedure = name, target = %node.target(), "inlined procedure call");
        self.visit(inlined)
    }
}

fn normalize_name(node: &ParseTree) -> Result<ParseTree, CompileError> {
    let name = special::procedure_name(node)
        .filter(|name| name.starts_with('_'))
        .ok_or_else(|| CompileError::Malformed {
            message: format!(
                "Procedure names must start with an underscore, found `{}`",
                node.to_text()
            ),
            target: node.target().clone(),
        })?;
    let mut literal = ParseTree::string(name).at(node.target().clone());
    literal.set_optimized(true);
    Ok(literal)
}

/// The expression of a `return(expr)` body.
fn returned_expression(body: &ParseTree) -> Option<&ParseTree> {
    match (body.special_form(), body.children()) {
        (Some(SpecialForm::Return), [expr]) => Some(expr),
        _ => None,
    }
}

/// Collect the variables `node` reads whatever its branches decide.
///
/// Only the first condition of `if` and `ifelse` is certain to run.
fn unconditional_reads(node: &ParseTree, reads: &mut HashSet<String>) {
    if let Construct::Variable(name) = node.data() {
        reads.insert(name.clone());
    }
    match node.special_form() {
        Some(SpecialForm::If | SpecialForm::IfElse) => {
            if let Some(condition) = node.children().first() {
                unconditional_reads(condition, reads);
            }
        }
        _ => {
            for child in node.children() {
                unconditional_reads(child, reads);
            }
        }
    }
}

fn substitute(mut node: ParseTree, bindings: &HashMap<&str, ParseTree>) -> ParseTree {
    if let Construct::Variable(name) = node.data() {
        if let Some(arg) = bindings.get(name.as_str()) {
            return arg.clone();
        }
    }
    let children = node
        .take_children()
        .into_iter()
        .map(|child| substitute(child, bindings))
        .collect();
    node.set_children(children);
    node
}
