//! Compile-time rewriting of parse trees
//!
//! The optimizer walks a tree bottom-up and applies four rewrites:
//!
//! - **Constant folding**: a pure builtin whose arguments are all literals
//!   is replaced by its result. A call that fails while folding is a
//!   compile error, never a deferred runtime error.
//! - **Branch elimination**: `if` and `ifelse` with constant conditions
//!   collapse to the taken branch.
//! - **Sequence flattening**: nested statement sequences merge into one
//!   `sconcat`, and `__autoconcat__` is normalized to `sconcat`.
//! - **Procedure inlining**: a call to a procedure whose body is a single
//!   side-effect-free `return(expr)` is replaced by `expr` with the
//!   arguments substituted. The definition itself stays in the tree.
//!
//! Every node the optimizer produces is flagged as optimized and is never
//! visited again, so optimizing an optimized tree changes nothing.

mod branch;
mod fold;
mod inline;
mod sequence;

use crate::error::CompileError;
use crate::registry::{Arity, FunctionRegistry};
use crate::special::SpecialForm;
use crate::tree::{Construct, ParseTree};
use inline::{FrameKind, Placement, Scopes};

/// Which rewrites the optimizer performs.
///
/// Static checks (unknown functions, argument counts, malformed special
/// forms) always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Replace pure calls on constants with their result
    pub fold_constants: bool,
    /// Drop branches whose condition is constant
    pub eliminate_branches: bool,
    /// Inline eligible procedure calls
    pub inline_procedures: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            eliminate_branches: true,
            inline_procedures: true,
        }
    }
}

/// Rewrites trees against a function registry.
///
/// # Example
///
/// ```
/// use thicket::{FunctionRegistry, Optimizer, ParseTree};
///
/// let registry = FunctionRegistry::with_prelude();
/// let tree = ParseTree::call(
///     "msg",
///     vec![ParseTree::call("add", vec![ParseTree::int(1), ParseTree::int(1)])],
/// );
///
/// let optimized = Optimizer::new(&registry).optimize(tree).unwrap();
/// assert_eq!(optimized.to_text(), "msg(2)");
/// ```
#[derive(Debug)]
pub struct Optimizer<'r> {
    registry: &'r FunctionRegistry,
    options: OptimizeOptions,
    scopes: Scopes,
}

impl<'r> Optimizer<'r> {
    /// Create an optimizer with every rewrite enabled.
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            options: OptimizeOptions::default(),
            scopes: Scopes::new(),
        }
    }

    /// Choose which rewrites run (builder style).
    pub fn with_options(mut self, options: OptimizeOptions) -> Self {
        self.options = options;
        self
    }

    /// The active options.
    pub fn options(&self) -> OptimizeOptions {
        self.options
    }

    /// Optimize a whole program.
    ///
    /// # Errors
    ///
    /// Returns the first `CompileError` found; no partially optimized tree
    /// is produced.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn optimize(&mut self, tree: ParseTree) -> Result<ParseTree, CompileError> {
        self.scopes = Scopes::new();
        self.visit(tree)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════

    fn visit(&mut self, node: ParseTree) -> Result<ParseTree, CompileError> {
        if node.is_optimized() {
            // Settled subtrees are not revisited, but procedures they
            // define still hide earlier definitions.
            self.scopes.shadow_definitions_in(&node);
            return Ok(node);
        }

        let is_call = matches!(node.data(), Construct::Function(_));
        let mut out = match node.special_form() {
            Some(form) => self.visit_special(form, node)?,
            None if is_call => self.visit_call(node)?,
            None => node,
        };
        out.set_optimized(true);
        Ok(out)
    }

    fn visit_special(
        &mut self,
        form: SpecialForm,
        node: ParseTree,
    ) -> Result<ParseTree, CompileError> {
        check_arity(form.name(), form.arity(), &node)?;
        match form {
            SpecialForm::AutoConcat | SpecialForm::Sequence => self.visit_sequence(node),
            SpecialForm::If => self.visit_if(node),
            SpecialForm::IfElse => self.visit_ifelse(node),
            SpecialForm::Proc => self.visit_proc(node, Placement::Nested),
            SpecialForm::Assign => self.visit_assign(node),
            SpecialForm::Closure => {
                self.scopes.push(FrameKind::Closure);
                let result = self.visit_children(node);
                self.scopes.pop();
                result
            }
            SpecialForm::Return | SpecialForm::Execute => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, mut node: ParseTree) -> Result<ParseTree, CompileError> {
        let children = node
            .take_children()
            .into_iter()
            .map(|child| self.visit(child))
            .collect::<Result<Vec<_>, _>>()?;
        node.set_children(children);
        Ok(node)
    }

    fn visit_call(&mut self, node: ParseTree) -> Result<ParseTree, CompileError> {
        let node = self.visit_children(node)?;
        let Some(name) = node.function_name().map(str::to_string) else {
            return Ok(node);
        };
        if name.starts_with('_') {
            self.inline_call(&name, node)
        } else {
            self.fold_call(&name, node)
        }
    }

    fn visit_assign(&mut self, node: ParseTree) -> Result<ParseTree, CompileError> {
        if let Some(first) = node.children().first() {
            if !matches!(first.data(), Construct::Variable(_)) {
                return Err(CompileError::Malformed {
                    message: format!("assign expects a variable, found `{}`", first.to_text()),
                    target: first.target().clone(),
                });
            }
        }
        self.visit_children(node)
    }

    /// Whether evaluating `node` can have no observable effect: it only
    /// calls pure builtins and transparent control forms.
    fn is_side_effect_free(&self, node: &ParseTree) -> bool {
        node.callable_symbols().iter().all(|name| {
            self.registry.is_pure(name)
                || SpecialForm::from_name(name).is_some_and(SpecialForm::is_transparent)
        })
    }
}

fn check_arity(name: &str, arity: Arity, node: &ParseTree) -> Result<(), CompileError> {
    if arity.accepts(node.child_count()) {
        Ok(())
    } else {
        Err(CompileError::ArityMismatch {
            name: name.to_string(),
            expected: arity,
            got: node.child_count(),
            target: node.target().clone(),
        })
    }
}

/// Optimize `tree` with every rewrite enabled.
///
/// # Errors
///
/// Returns the first `CompileError` found.
pub fn optimize(tree: ParseTree, registry: &FunctionRegistry) -> Result<ParseTree, CompileError> {
    Optimizer::new(registry).optimize(tree)
}
