//! Branch elimination for `if` and `ifelse`

use super::Optimizer;
use crate::error::CompileError;
use crate::tree::ParseTree;
use crate::value::Value;

impl Optimizer<'_> {
    /// The truthiness of an optimized condition, when it is a literal and
    /// branch elimination is on.
    fn constant_condition(&self, cond: &ParseTree) -> Option<bool> {
        if !self.options.eliminate_branches {
            return None;
        }
        cond.value().map(Value::is_truthy)
    }

    pub(super) fn visit_if(&mut self, mut node: ParseTree) -> Result<ParseTree, CompileError> {
        let target = node.target().clone();
        let mut parts = node.take_children().into_iter();
        let (Some(cond), Some(then)) = (parts.next(), parts.next()) else {
            return Err(CompileError::Malformed {
                message: "if needs a condition and a branch".to_string(),
                target,
            });
        };
        let otherwise = parts.next();

        let cond = self.visit(cond)?;
        match self.constant_condition(&cond) {
            Some(true) => {
                tracing::debug!(%target, "if condition is always true");
                self.visit(then)
            }
            Some(false) => {
                tracing::debug!(%target, "if condition is always false");
                match otherwise {
                    Some(otherwise) => self.visit(otherwise),
                    None => Ok(ParseTree::void().at(target)),
                }
            }
            None => {
                let mut children = vec![cond, self.visit(then)?];
                if let Some(otherwise) = otherwise {
                    children.push(self.visit(otherwise)?);
                }
                node.set_children(children);
                Ok(node)
            }
        }
    }

    /// `ifelse(c1, b1, c2, b2, ..., [else])`: constant-false pairs are
    /// dropped; a constant-true condition makes its branch the final one.
    pub(super) fn visit_ifelse(&mut self, mut node: ParseTree) -> Result<ParseTree, CompileError> {
        let target = node.target().clone();
        let mut parts = node.take_children();
        let otherwise = if parts.len() % 2 == 1 { parts.pop() } else { None };

        let mut kept = Vec::with_capacity(parts.len() + 1);
        let mut pairs = parts.into_iter();
        while let (Some(cond), Some(branch)) = (pairs.next(), pairs.next()) {
            let cond = self.visit(cond)?;
            match self.constant_condition(&cond) {
                Some(false) => {
                    tracing::debug!(%target, "dropping ifelse branch that never runs");
                }
                Some(true) => {
                    tracing::debug!(%target, "ifelse branch always runs");
                    let branch = self.visit(branch)?;
                    if kept.is_empty() {
                        return Ok(branch);
                    }
                    kept.push(branch);
                    node.set_children(kept);
                    return Ok(node);
                }
                None => {
                    kept.push(cond);
                    kept.push(self.visit(branch)?);
                }
            }
        }

        let otherwise = otherwise.map(|o| self.visit(o)).transpose()?;
        match (kept.is_empty(), otherwise) {
            (true, Some(otherwise)) => Ok(otherwise),
            (true, None) => Ok(ParseTree::void().at(target)),
            (false, otherwise) => {
                kept.extend(otherwise);
                node.set_children(kept);
                Ok(node)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::optimize::optimize;
    use crate::registry::FunctionRegistry;
    use crate::tree::ParseTree;

    fn text(tree: ParseTree) -> String {
        optimize(tree, &FunctionRegistry::with_prelude())
            .unwrap()
            .to_text()
    }

    fn msg(s: &str) -> ParseTree {
        ParseTree::call("msg", vec![ParseTree::string(s)])
    }

    fn dynamic() -> ParseTree {
        ParseTree::call("dyn", vec![])
    }

    #[test]
    fn test_if_true_takes_then() {
        let tree = ParseTree::call("if", vec![ParseTree::boolean(true), msg("hi"), msg("fail")]);
        assert_eq!(text(tree), "msg('hi')");
    }

    #[test]
    fn test_if_false_without_else_is_void() {
        let tree = ParseTree::call("if", vec![ParseTree::boolean(false), msg("hi")]);
        assert_eq!(text(tree), "");
    }

    #[test]
    fn test_if_folded_condition() {
        let cond = ParseTree::call("lt", vec![ParseTree::int(2), ParseTree::int(1)]);
        let tree = ParseTree::call("if", vec![cond, msg("a"), msg("b")]);
        assert_eq!(text(tree), "msg('b')");
    }

    #[test]
    fn test_dynamic_if_keeps_both_branches() {
        let tree = ParseTree::call("if", vec![dynamic(), msg("a"), msg("b")]);
        assert_eq!(text(tree), "if(dyn(),msg('a'),msg('b'))");
    }

    #[test]
    fn test_ifelse_drops_false_pairs() {
        let tree = ParseTree::call(
            "ifelse",
            vec![
                ParseTree::boolean(false),
                msg("never"),
                dynamic(),
                msg("maybe"),
                msg("else"),
            ],
        );
        assert_eq!(text(tree), "ifelse(dyn(),msg('maybe'),msg('else'))");
    }

    #[test]
    fn test_ifelse_true_becomes_else() {
        let tree = ParseTree::call(
            "ifelse",
            vec![
                dynamic(),
                msg("maybe"),
                ParseTree::boolean(true),
                msg("always"),
                msg("unreachable"),
            ],
        );
        assert_eq!(text(tree), "ifelse(dyn(),msg('maybe'),msg('always'))");
    }

    #[test]
    fn test_ifelse_all_false_uses_else() {
        let tree = ParseTree::call(
            "ifelse",
            vec![ParseTree::int(0), msg("no"), msg("yes")],
        );
        assert_eq!(text(tree), "msg('yes')");
    }
}
