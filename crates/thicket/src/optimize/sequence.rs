//! Statement sequence flattening

use super::inline::{FrameKind, Placement};
use super::Optimizer;
use crate::error::CompileError;
use crate::special::SpecialForm;
use crate::tree::{ParseTree, Target};
use crate::value::Value;

impl Optimizer<'_> {
    pub(super) fn visit_sequence(&mut self, mut node: ParseTree) -> Result<ParseTree, CompileError> {
        self.scopes.push(FrameKind::Sequence);
        let result = self.visit_statements(node.take_children());
        self.scopes.pop();
        Ok(collapse(node.target().clone(), result?))
    }

    fn visit_statements(
        &mut self,
        statements: Vec<ParseTree>,
    ) -> Result<Vec<ParseTree>, CompileError> {
        let mut out = Vec::with_capacity(statements.len());
        for statement in statements {
            let visited = if statement.special_form() == Some(SpecialForm::Proc) {
                self.visit_proc(statement, Placement::Sequence)?
            } else {
                self.visit(statement)?
            };
            splice(&mut out, visited);
        }

        // A void literal only matters as the sequence's result
        let last = out.len().saturating_sub(1);
        let mut index = 0;
        out.retain(|statement| {
            let keep = index == last || statement.value() != Some(&Value::Void);
            index += 1;
            keep
        });
        Ok(out)
    }
}

fn splice(out: &mut Vec<ParseTree>, mut statement: ParseTree) {
    if statement.special_form().is_some_and(SpecialForm::is_sequence) {
        out.extend(statement.take_children());
    } else {
        out.push(statement);
    }
}

fn collapse(target: Target, mut statements: Vec<ParseTree>) -> ParseTree {
    match statements.len() {
        0 => ParseTree::void().at(target),
        1 => statements.remove(0),
        _ => ParseTree::call(SpecialForm::Sequence.name(), statements).at(target),
    }
}
