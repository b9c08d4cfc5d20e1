//! Builtins that let a script look at itself

use std::fmt;
use std::str::FromStr;

use super::{Arity, BuiltinFn, CallSite, FunctionRegistry};
use crate::special::SpecialForm;
use crate::tree::ParseTree;
use crate::value::Value;

const UNKNOWN_FILE: &str = "Unknown (maybe the interpreter?)";

/// A part of a `returnType {args} description` docs string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocField {
    /// The return type (same as [`DocField::Return`])
    Type,
    /// The return type
    Return,
    /// The argument list between the braces
    Args,
    /// Everything after the argument list
    Description,
}

impl FromStr for DocField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "type" => Ok(DocField::Type),
            "return" => Ok(DocField::Return),
            "args" => Ok(DocField::Args),
            "description" => Ok(DocField::Description),
            _ => Err(format!("Invalid docField provided: {}", s)),
        }
    }
}

impl fmt::Display for DocField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocField::Type => "type",
            DocField::Return => "return",
            DocField::Args => "args",
            DocField::Description => "description",
        })
    }
}

impl DocField {
    /// Pull this field out of a docs string.
    pub fn extract(self, docs: &str) -> Result<String, String> {
        let unparsable = || format!("unable to parse documentation: {}", docs);
        let open = docs.find('{').ok_or_else(unparsable)?;
        let close = docs[open..].find('}').map(|i| open + i).ok_or_else(unparsable)?;
        let part = match self {
            DocField::Type | DocField::Return => &docs[..open],
            DocField::Args => &docs[open + 1..close],
            DocField::Description => &docs[close + 1..],
        };
        Ok(part.trim().to_string())
    }
}

pub(super) fn register(registry: &FunctionRegistry) {
    registry.register(
        BuiltinFn::new("reflect_pull", Arity::Range(1, 2), reflect_pull).with_docs(
            "mixed {param, [name]} Returns information about the running script. param is one of \
             label, command, varlist, line_num, col or file; varlist takes an optional variable name.",
        ),
    );
    registry.register(
        BuiltinFn::new("reflect_docs", Arity::Exact(2), reflect_docs)
            .with_docs(
                "string {element, docField} Returns the documentation for an element. docField is one \
                 of type, return, args or description. Variables and procedures are checked for \
                 existence and yield null.",
            )
            .with_static_check(check_reflect_docs)
            .with_fold_when(docs_are_static),
    );
}

fn reflect_pull(args: &[Value], site: &CallSite<'_>) -> Result<Value, String> {
    let env = site.env()?;
    let param = args[0].to_string().to_ascii_lowercase();
    let optional = |s: Option<&str>| s.map(Value::string).unwrap_or(Value::Null);

    match (param.as_str(), args.get(1)) {
        ("label", None) => Ok(optional(env.label())),
        ("command", None) => Ok(optional(env.command())),
        ("varlist", None) => Ok(Value::array(
            env.variable_names().into_iter().map(Value::string).collect(),
        )),
        ("varlist", Some(name)) => {
            let name = name.to_string();
            env.get(&name)
                .cloned()
                .ok_or_else(|| format!("Variable {} is not bound", name))
        }
        ("line_num", None) => Ok(Value::Int(i64::from(site.target.line))),
        ("col", None) => Ok(Value::Int(i64::from(site.target.col))),
        ("file", None) => Ok(Value::string(match site.target.file() {
            Some(path) => path.display().to_string(),
            None => UNKNOWN_FILE.to_string(),
        })),
        _ => Err(
            "The arguments passed to reflect_pull are incorrect. Please check them and try again."
                .to_string(),
        ),
    }
}

fn reflect_docs(args: &[Value], site: &CallSite<'_>) -> Result<Value, String> {
    let element = args[0].to_string();
    let field: DocField = args[1].to_string().parse()?;

    if element.starts_with('@') {
        let env = site.env()?;
        if !env.contains(&element) {
            return Err(format!(
                "Invalid variable provided: {} does not exist in the current scope",
                element
            ));
        }
        return Ok(Value::Null);
    }
    if element.starts_with('_') {
        let env = site.env()?;
        if env.procedure(&element).is_none() {
            return Err(format!(
                "Invalid procedure name provided: {} does not exist in the current scope",
                element
            ));
        }
        return Ok(Value::Null);
    }

    let docs = site
        .registry
        .docs(&element)
        .ok_or_else(|| format!("Unknown function: {}", element))?;
    field.extract(&docs).map(Value::string)
}

/// Function docs are fixed at compile time; variables and procedures are
/// looked up in the running environment.
fn docs_are_static(args: &[ParseTree]) -> bool {
    args.first()
        .and_then(ParseTree::value)
        .map(|element| element.to_string())
        .is_some_and(|name| !name.starts_with('@') && !name.starts_with('_'))
}

fn check_reflect_docs(args: &[ParseTree], registry: &FunctionRegistry) -> Result<(), String> {
    if let Some(element) = args.first().and_then(ParseTree::value) {
        let name = element.to_string();
        let is_function = !name.starts_with('_') && !name.starts_with('@');
        if is_function && !registry.contains(&name) && SpecialForm::from_name(&name).is_none() {
            return Err(format!("Unknown function: {}", name));
        }
    }
    if let Some(field) = args.get(1).and_then(ParseTree::value) {
        field.to_string().parse::<DocField>()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_field_parse() {
        assert_eq!("Args".parse::<DocField>(), Ok(DocField::Args));
        assert_eq!(
            "colour".parse::<DocField>(),
            Err("Invalid docField provided: colour".to_string())
        );
    }

    #[test]
    fn test_extract() {
        let docs = "string {element, docField} Returns the documentation.";
        assert_eq!(DocField::Type.extract(docs), Ok("string".to_string()));
        assert_eq!(DocField::Return.extract(docs), Ok("string".to_string()));
        assert_eq!(DocField::Args.extract(docs), Ok("element, docField".to_string()));
        assert_eq!(
            DocField::Description.extract(docs),
            Ok("Returns the documentation.".to_string())
        );
        assert!(DocField::Args.extract("no braces").is_err());
    }

    #[test]
    fn test_static_check() {
        let registry = FunctionRegistry::with_prelude();
        let ok = [ParseTree::string("add"), ParseTree::string("args")];
        assert_eq!(check_reflect_docs(&ok, &registry), Ok(()));

        let unknown = [ParseTree::string("nope"), ParseTree::string("args")];
        assert_eq!(
            check_reflect_docs(&unknown, &registry),
            Err("Unknown function: nope".to_string())
        );

        let bad_field = [ParseTree::variable("@x"), ParseTree::string("colour")];
        assert!(check_reflect_docs(&bad_field, &registry).is_err());

        let procedure = [ParseTree::string("_mine"), ParseTree::variable("@f")];
        assert_eq!(check_reflect_docs(&procedure, &registry), Ok(()));
    }
}
