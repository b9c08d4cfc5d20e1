//! One-way projection of a tree back to source-like text

use super::{Construct, ParseTree};
use crate::special::SpecialForm;
use crate::value::Value;

/// Escape a string for display inside single quotes.
///
/// Backslashes are escaped first so the escapes added for tabs, newlines
/// and quotes are not themselves doubled.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

pub(super) fn render(node: &ParseTree, out: &mut String) {
    match node.data() {
        Construct::Function(name) => {
            out.push_str(name);
            out.push('(');
            let separator = if SpecialForm::from_name(name) == Some(SpecialForm::AutoConcat) {
                ""
            } else {
                ","
            };
            for (i, child) in node.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(separator);
                }
                render(child, out);
            }
            out.push(')');
        }
        Construct::Literal(Value::String(s)) => {
            out.push('\'');
            out.push_str(&escape_string(s));
            out.push('\'');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\tb"), "a\\tb");
        assert_eq!(escape_string("line\n"), "line\\n");
        assert_eq!(escape_string("it's"), "it\\'s");
        assert_eq!(escape_string("C:\\dir"), "C:\\\\dir");
    }

    #[test]
    fn test_render_call() {
        let tree = ParseTree::call(
            "msg",
            vec![ParseTree::string("hi"), ParseTree::variable("@who")],
        );
        assert_eq!(tree.to_text(), "msg('hi',@who)");
    }

    #[test]
    fn test_render_autoconcat_without_separators() {
        let tree = ParseTree::call(
            "__autoconcat__",
            vec![
                ParseTree::call("msg", vec![ParseTree::string("a")]),
                ParseTree::call("msg", vec![ParseTree::string("b")]),
            ],
        );
        assert_eq!(tree.to_text(), "__autoconcat__(msg('a')msg('b'))");
    }

    #[test]
    fn test_render_literals() {
        let tree = ParseTree::call(
            "f",
            vec![
                ParseTree::int(4),
                ParseTree::boolean(true),
                ParseTree::null(),
                ParseTree::literal(Value::Double(1.5)),
                ParseTree::literal(Value::array(vec![Value::Int(1), Value::Int(2)])),
            ],
        );
        assert_eq!(tree.to_text(), "f(4,true,null,1.5,{1, 2})");
    }
}
