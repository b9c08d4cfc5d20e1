//! Builtin call checking and constant folding

use super::{check_arity, Optimizer};
use crate::error::CompileError;
use crate::registry::CallSite;
use crate::tree::ParseTree;
use crate::value::Value;

impl Optimizer<'_> {
    /// Check a builtin call, then fold it if it is foldable and every
    /// argument is a literal. `node`'s children are already optimized.
    pub(super) fn fold_call(&mut self, name: &str, node: ParseTree) -> Result<ParseTree, CompileError> {
        let builtin = self
            .registry
            .get(name)
            .ok_or_else(|| CompileError::UnknownFunction {
                name: name.to_string(),
                target: node.target().clone(),
            })?;

        check_arity(name, builtin.arity, &node)?;

        if let Some(check) = &builtin.static_check {
            check(node.children(), self.registry).map_err(|message| {
                CompileError::InvalidArgument {
                    name: name.to_string(),
                    message,
                    target: node.target().clone(),
                }
            })?;
        }

        if !self.options.fold_constants
            || !node.children().iter().all(ParseTree::is_const)
            || !builtin.is_foldable(node.children())
        {
            return Ok(node);
        }

        let args: Vec<Value> = node
            .children()
            .iter()
            .filter_map(|child| child.value().cloned())
            .collect();
        let site = CallSite {
            target: node.target(),
            env: None,
            registry: self.registry,
        };

        match builtin.call(&args, &site) {
            Ok(value) => {
                tracing::debug!(function = name, result = ?value, "folded constant call");
                Ok(ParseTree::literal(value).at(node.target().clone()))
            }
            Err(message) => Err(CompileError::FoldFailed {
                name: name.to_string(),
                message,
                target: node.target().clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::optimize::optimize;
    use crate::registry::FunctionRegistry;
    use crate::tree::{ParseTree, Target};
    use crate::value::Value;

    fn run(tree: ParseTree) -> Result<ParseTree, CompileError> {
        optimize(tree, &FunctionRegistry::with_prelude())
    }

    #[test]
    fn test_fold_nested_arithmetic() {
        let tree = ParseTree::call(
            "msg",
            vec![ParseTree::call(
                "multiply",
                vec![
                    ParseTree::call("add", vec![ParseTree::int(1), ParseTree::int(1)]),
                    ParseTree::int(3),
                ],
            )],
        );
        assert_eq!(run(tree).unwrap().to_text(), "msg(6)");
    }

    #[test]
    fn test_folded_literal_keeps_call_position() {
        let tree = ParseTree::call("add", vec![ParseTree::int(1), ParseTree::int(2)])
            .at(Target::at(4, 9));
        let out = run(tree).unwrap();
        assert_eq!(out.value(), Some(&Value::Int(3)));
        assert_eq!(out.target(), &Target::at(4, 9));
    }

    #[test]
    fn test_division_by_zero_is_a_compile_error() {
        let tree = ParseTree::call("divide", vec![ParseTree::int(1), ParseTree::int(0)])
            .at(Target::at(2, 2));
        assert_eq!(
            run(tree),
            Err(CompileError::FoldFailed {
                name: "divide".to_string(),
                message: "Division by 0!".to_string(),
                target: Target::at(2, 2),
            })
        );
    }

    #[test]
    fn test_function_docs_fold_but_variable_docs_do_not() {
        let docs = |element: &str| {
            ParseTree::call(
                "reflect_docs",
                vec![ParseTree::string(element), ParseTree::string("return")],
            )
        };
        assert_eq!(run(docs("add")).unwrap().value(), Some(&Value::string("number")));
        assert_eq!(run(docs("@x")).unwrap().to_text(), "reflect_docs('@x','return')");
        assert_eq!(run(docs("_p")).unwrap().to_text(), "reflect_docs('_p','return')");
    }

    #[test]
    fn test_dynamic_arguments_block_folding() {
        let tree = ParseTree::call("add", vec![ParseTree::variable("@a"), ParseTree::int(1)]);
        assert_eq!(run(tree).unwrap().to_text(), "add(@a,1)");
    }

    #[test]
    fn test_impure_calls_are_not_folded() {
        let tree = ParseTree::call("dyn", vec![ParseTree::int(1)]);
        assert_eq!(run(tree).unwrap().to_text(), "dyn(1)");
    }

    #[test]
    fn test_static_check_rejects_bad_doc_field() {
        let tree = ParseTree::call(
            "reflect_docs",
            vec![ParseTree::string("add"), ParseTree::string("colour")],
        );
        assert_eq!(
            run(tree),
            Err(CompileError::InvalidArgument {
                name: "reflect_docs".to_string(),
                message: "Invalid docField provided: colour".to_string(),
                target: Target::unknown(),
            })
        );
    }
}
