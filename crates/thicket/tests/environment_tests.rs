//! Environment tests

use std::sync::Arc;

use pretty_assertions::assert_eq;
use thicket::*;

fn procedure(name: &str, params: &[&str]) -> Procedure {
    Procedure {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        defaults: vec![Value::Null; params.len()],
        body: Arc::new(ParseTree::void()),
        target: Target::unknown(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Variables
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_new_environment_is_empty() {
    let env = Environment::new();
    assert!(env.is_empty());
    assert_eq!(env.len(), 0);
    assert_eq!(env.call_depth(), 0);
    assert_eq!(env.label(), None);
}

#[test]
fn test_set_overwrites_in_place() {
    let mut env = Environment::new();
    env.set("@a", Value::Int(1));
    env.set("@b", Value::Int(2));
    env.set("@a", Value::Int(3));

    assert_eq!(env.len(), 2);
    assert_eq!(env.get("@a"), Some(&Value::Int(3)));
    assert_eq!(env.variable_names(), vec!["@a".to_string(), "@b".to_string()]);
}

#[test]
fn test_remove_and_clear() {
    let mut env = Environment::new();
    env.set("@a", Value::Int(1));
    env.set("@b", Value::Int(2));

    assert_eq!(env.remove("@a"), Some(Value::Int(1)));
    assert_eq!(env.remove("@a"), None);
    assert!(!env.contains("@a"));

    env.clear();
    assert!(env.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Metadata
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_builder_metadata() {
    let env = Environment::new()
        .with_label("admin")
        .with_command("/build")
        .with_script("build.ms");
    assert_eq!(env.label(), Some("admin"));
    assert_eq!(env.command(), Some("/build"));
    assert_eq!(env.script(), Some("build.ms"));
}

// ═══════════════════════════════════════════════════════════════════════
// Procedures and Scoping
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_define_and_replace_procedure() {
    let mut env = Environment::new();
    env.define_procedure(procedure("_f", &["@a"]));
    assert_eq!(env.procedure("_f").map(|p| p.arity()), Some(1));

    env.define_procedure(procedure("_f", &["@a", "@b"]));
    assert_eq!(env.procedure("_f").map(|p| p.arity()), Some(2));
    assert_eq!(env.procedures().count(), 1);
}

#[test]
fn test_procedure_scope_keeps_procedures_and_metadata() {
    let mut env = Environment::new().with_label("lbl");
    env.set("@x", Value::Int(1));
    env.define_procedure(procedure("_f", &[]));

    let scope = env.procedure_scope();
    assert!(scope.is_empty());
    assert!(scope.procedure("_f").is_some());
    assert_eq!(scope.label(), Some("lbl"));
}

#[test]
fn test_try_clone_is_independent() {
    let mut env = Environment::new();
    env.set("@list", Value::array(vec![Value::Int(1)]));

    let mut copy = env.try_clone().unwrap();
    copy.set("@list", Value::array(vec![]));
    copy.set("@new", Value::Null);

    assert_eq!(env.get("@list"), Some(&Value::array(vec![Value::Int(1)])));
    assert!(!env.contains("@new"));
}

// ═══════════════════════════════════════════════════════════════════════
// Call Depth
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_call_depth_tracking() {
    let mut env = Environment::new();
    env.enter_call(2).unwrap();
    env.enter_call(2).unwrap();
    assert_eq!(env.call_depth(), 2);
    assert!(matches!(
        env.enter_call(2),
        Err(EvalError::StackOverflow { depth: 3, max: 2 })
    ));

    env.exit_call();
    env.exit_call();
    env.exit_call();
    assert_eq!(env.call_depth(), 0);
}
