//! Special forms: calls the evaluator and optimizer handle themselves
//!
//! Ordinary builtins receive already-evaluated arguments. Special forms
//! control if, when and where their children are evaluated, so they are not
//! registered in the [`FunctionRegistry`](crate::FunctionRegistry).

use std::fmt;

use crate::registry::Arity;
use crate::tree::{Construct, ParseTree};

/// A control construct known to both the optimizer and the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    /// `__autoconcat__(...)`: statements the parser found side by side
    AutoConcat,
    /// `sconcat(...)`: evaluate in order, yield the last value
    Sequence,
    /// `if(cond, then[, else])`
    If,
    /// `ifelse(c1, b1, c2, b2, ...[, else])`
    IfElse,
    /// `proc(name, params..., body)`
    Proc,
    /// `assign(@var, value)`
    Assign,
    /// `return([value])`
    Return,
    /// `closure(params..., body)`
    Closure,
    /// `execute(args..., closure)`
    Execute,
}

impl SpecialForm {
    /// Every special form, in declaration order.
    pub const ALL: [SpecialForm; 9] = [
        SpecialForm::AutoConcat,
        SpecialForm::Sequence,
        SpecialForm::If,
        SpecialForm::IfElse,
        SpecialForm::Proc,
        SpecialForm::Assign,
        SpecialForm::Return,
        SpecialForm::Closure,
        SpecialForm::Execute,
    ];

    /// Look up a special form by its call name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "__autoconcat__" => SpecialForm::AutoConcat,
            "sconcat" => SpecialForm::Sequence,
            "if" => SpecialForm::If,
            "ifelse" => SpecialForm::IfElse,
            "proc" => SpecialForm::Proc,
            "assign" => SpecialForm::Assign,
            "return" => SpecialForm::Return,
            "closure" => SpecialForm::Closure,
            "execute" => SpecialForm::Execute,
            _ => return None,
        })
    }

    /// The call name.
    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::AutoConcat => "__autoconcat__",
            SpecialForm::Sequence => "sconcat",
            SpecialForm::If => "if",
            SpecialForm::IfElse => "ifelse",
            SpecialForm::Proc => "proc",
            SpecialForm::Assign => "assign",
            SpecialForm::Return => "return",
            SpecialForm::Closure => "closure",
            SpecialForm::Execute => "execute",
        }
    }

    /// Accepted child counts.
    pub fn arity(self) -> Arity {
        match self {
            SpecialForm::AutoConcat | SpecialForm::Sequence | SpecialForm::Closure => {
                Arity::AtLeast(0)
            }
            SpecialForm::If => Arity::Range(2, 3),
            SpecialForm::IfElse => Arity::AtLeast(2),
            SpecialForm::Proc | SpecialForm::Execute => Arity::AtLeast(1),
            SpecialForm::Assign => Arity::Exact(2),
            SpecialForm::Return => Arity::Range(0, 1),
        }
    }

    /// Whether the form itself has no effect beyond evaluating its children.
    ///
    /// Sequences and conditionals qualify; defining, assigning, returning,
    /// capturing and invoking do not.
    pub fn is_transparent(self) -> bool {
        matches!(
            self,
            SpecialForm::AutoConcat
                | SpecialForm::Sequence
                | SpecialForm::If
                | SpecialForm::IfElse
        )
    }

    /// Whether this form is a statement sequence.
    pub fn is_sequence(self) -> bool {
        matches!(self, SpecialForm::AutoConcat | SpecialForm::Sequence)
    }

    /// Documentation in `returnType {args} description` form.
    pub fn docs(self) -> &'static str {
        match self {
            SpecialForm::AutoConcat => {
                "mixed {statements...} Produced by the parser for statements written side by side."
            }
            SpecialForm::Sequence => {
                "mixed {statements...} Runs each statement in order and returns the last result."
            }
            SpecialForm::If => {
                "mixed {cond, then, [else]} Runs then if cond is true, otherwise else."
            }
            SpecialForm::IfElse => {
                "mixed {cond1, branch1, [cond2, branch2...], [else]} Runs the branch of the first true condition."
            }
            SpecialForm::Proc => {
                "void {name, [@params...], body} Defines a procedure in the current scope."
            }
            SpecialForm::Assign => "mixed {@var, value} Binds value to the variable and returns it.",
            SpecialForm::Return => {
                "void {[value]} Returns from the enclosing procedure or closure."
            }
            SpecialForm::Closure => {
                "closure {[@params...], body} Creates an anonymous procedure that captures the current scope."
            }
            SpecialForm::Execute => {
                "mixed {[args...], closure} Invokes the closure with the given arguments."
            }
        }
    }
}

/// Split a parameter node into its name and default expression.
///
/// Parameters are written `@name` or `assign(@name, default)`.
pub fn parameter(node: &ParseTree) -> Option<(&str, Option<&ParseTree>)> {
    match node.data() {
        Construct::Variable(name) => Some((name.as_str(), None)),
        Construct::Function(_) if node.special_form() == Some(SpecialForm::Assign) => {
            match (node.children().first()?.data(), node.children().get(1)) {
                (Construct::Variable(name), default @ Some(_)) => Some((name.as_str(), default)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// The name a `proc` definition gives its procedure: a string literal or a
/// bare identifier.
pub fn procedure_name(node: &ParseTree) -> Option<&str> {
    match node.data() {
        Construct::Literal(value) => value.as_str(),
        Construct::Function(name) if !node.has_children() && node.special_form().is_none() => {
            Some(name.as_str())
        }
        _ => None,
    }
}

impl fmt::Display for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for form in SpecialForm::ALL {
            assert_eq!(SpecialForm::from_name(form.name()), Some(form));
        }
        assert_eq!(SpecialForm::from_name("add"), None);
    }

    #[test]
    fn test_transparency() {
        assert!(SpecialForm::If.is_transparent());
        assert!(SpecialForm::AutoConcat.is_transparent());
        assert!(!SpecialForm::Assign.is_transparent());
        assert!(!SpecialForm::Proc.is_transparent());
    }

    #[test]
    fn test_parameter_shapes() {
        let plain = ParseTree::variable("@a");
        assert_eq!(parameter(&plain), Some(("@a", None)));

        let defaulted = ParseTree::call(
            "assign",
            vec![ParseTree::variable("@b"), ParseTree::int(2)],
        );
        let (name, default) = parameter(&defaulted).unwrap();
        assert_eq!(name, "@b");
        assert_eq!(default, Some(&ParseTree::int(2)));

        assert_eq!(parameter(&ParseTree::int(1)), None);
    }

    #[test]
    fn test_procedure_name() {
        assert_eq!(procedure_name(&ParseTree::string("_p")), Some("_p"));
        assert_eq!(procedure_name(&ParseTree::ident("_p")), Some("_p"));
        assert_eq!(procedure_name(&ParseTree::variable("@p")), None);
    }

    #[test]
    fn test_arity() {
        assert!(SpecialForm::If.arity().accepts(3));
        assert!(!SpecialForm::If.arity().accepts(4));
        assert!(SpecialForm::Return.arity().accepts(0));
    }
}
