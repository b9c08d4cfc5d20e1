//! Evaluator tests: running optimized programs end to end

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use thicket::*;

fn program(statements: Vec<ParseTree>) -> ParseTree {
    ParseTree::call("__autoconcat__", statements)
}

fn proc(name: &str, mut rest: Vec<ParseTree>) -> ParseTree {
    rest.insert(0, ParseTree::ident(name));
    ParseTree::call("proc", rest)
}

fn call(name: &str, args: Vec<ParseTree>) -> ParseTree {
    ParseTree::call(name, args)
}

fn var(name: &str) -> ParseTree {
    ParseTree::variable(name)
}

fn assign(name: &str, value: ParseTree) -> ParseTree {
    call("assign", vec![var(name), value])
}

/// An environment whose output is collected into the returned buffer.
fn captured() -> (Environment, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let env = Environment::new().with_output(move |line| sink.lock().push(line.to_string()));
    (env, lines)
}

fn eval_program(tree: ParseTree) -> thicket::Result<Value> {
    let mut env = Environment::new();
    compile_and_run(tree, &mut env, &EvalContext::new())
}

// ═══════════════════════════════════════════════════════════════════════
// Basics
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_sequence_yields_last_value() {
    let tree = program(vec![
        assign("@x", ParseTree::int(20)),
        call("add", vec![var("@x"), var("@x"), ParseTree::int(2)]),
    ]);
    assert_eq!(eval_program(tree).unwrap(), Value::Int(42));
}

#[test]
fn test_msg_writes_to_output() {
    let (mut env, lines) = captured();
    let tree = program(vec![
        assign("@who", ParseTree::string("world")),
        call("msg", vec![ParseTree::string("hello "), var("@who")]),
    ]);
    let result = compile_and_run(tree, &mut env, &EvalContext::new()).unwrap();
    assert_eq!(result, Value::Void);
    assert_eq!(*lines.lock(), vec!["hello world".to_string()]);
}

#[test]
fn test_dynamic_branch_runs_at_runtime() {
    let (mut env, lines) = captured();
    let tree = call(
        "ifelse",
        vec![
            call("dyn", vec![ParseTree::boolean(false)]),
            call("msg", vec![ParseTree::string("nope")]),
            call("msg", vec![ParseTree::string("yes")]),
        ],
    );
    compile_and_run(tree, &mut env, &EvalContext::new()).unwrap();
    assert_eq!(*lines.lock(), vec!["yes".to_string()]);
}

#[test]
fn test_unbound_variable_is_an_error() {
    let tree = call("msg", vec![var("@missing")]);
    let err = eval_program(tree).unwrap_err();
    assert!(matches!(
        err,
        ThicketError::Eval(EvalError::UndefinedVariable { ref name, .. }) if name == "@missing"
    ));
}

#[test]
fn test_runtime_builtin_failure() {
    let tree = program(vec![
        assign("@zero", call("dyn", vec![ParseTree::int(0)])),
        call("divide", vec![ParseTree::int(1), var("@zero")]),
    ]);
    match eval_program(tree).unwrap_err() {
        ThicketError::Eval(EvalError::BuiltinError { name, message, .. }) => {
            assert_eq!(name, "divide");
            assert_eq!(message, "Division by 0!");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_compile_errors_stop_before_running() {
    let (mut env, lines) = captured();
    let tree = program(vec![
        call("msg", vec![ParseTree::string("should not print")]),
        call("modulo", vec![ParseTree::int(1)]),
    ]);
    let err = compile_and_run(tree, &mut env, &EvalContext::new()).unwrap_err();
    assert!(matches!(err, ThicketError::Compile(CompileError::ArityMismatch { .. })));
    assert!(lines.lock().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Procedures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_procedure_with_side_effects_runs() {
    let (mut env, lines) = captured();
    let tree = program(vec![
        proc(
            "_greet",
            vec![
                var("@name"),
                call("msg", vec![ParseTree::string("hi "), var("@name")]),
            ],
        ),
        call("_greet", vec![ParseTree::string("ann")]),
        call("_greet", vec![ParseTree::string("bob")]),
    ]);
    compile_and_run(tree, &mut env, &EvalContext::new()).unwrap();
    assert_eq!(
        *lines.lock(),
        vec!["hi ann".to_string(), "hi bob".to_string()]
    );
}

#[test]
fn test_procedure_without_return_yields_void() {
    let tree = program(vec![
        proc("_noop", vec![call("dyn", vec![ParseTree::int(1)])]),
        call("_noop", vec![]),
    ]);
    assert_eq!(eval_program(tree).unwrap(), Value::Void);
}

#[test]
fn test_procedure_defaults_and_arguments() {
    let tree = program(vec![
        proc(
            "_count",
            vec![
                var("@a"),
                assign("@b", ParseTree::int(10)),
                call(
                    "return",
                    vec![call(
                        "array",
                        vec![
                            var("@b"),
                            call("array_size", vec![var("@arguments")]),
                        ],
                    )],
                ),
            ],
        ),
        call("_count", vec![call("dyn", vec![ParseTree::int(1)])]),
    ]);
    assert_eq!(
        eval_program(tree).unwrap(),
        Value::array(vec![Value::Int(10), Value::Int(1)])
    );
}

#[test]
fn test_procedure_does_not_see_caller_variables() {
    let tree = program(vec![
        assign("@secret", ParseTree::int(1)),
        proc("_peek", vec![call("return", vec![var("@secret")])]),
        call("_peek", vec![]),
    ]);
    let err = eval_program(tree).unwrap_err();
    assert!(matches!(
        err,
        ThicketError::Eval(EvalError::UndefinedVariable { .. })
    ));
}

#[test]
fn test_undefined_procedure() {
    let tree = call("_ghost", vec![]);
    let err = eval_program(tree).unwrap_err();
    assert!(matches!(
        err,
        ThicketError::Eval(EvalError::UndefinedProcedure { ref name, .. }) if name == "_ghost"
    ));
}

#[test]
fn test_recursion_hits_call_depth_limit() {
    let tree = program(vec![
        proc("_forever", vec![call("return", vec![call("_forever", vec![])])]),
        call("_forever", vec![]),
    ]);
    let mut env = Environment::new();
    let ctx = EvalContext::new().with_max_call_depth(16);
    let err = compile_and_run(tree, &mut env, &ctx).unwrap_err();
    assert!(matches!(
        err,
        ThicketError::Eval(EvalError::StackOverflow { depth: 17, max: 16 })
    ));
}

#[test]
fn test_recursive_factorial() {
    // _fact(@n) = if(lt(@n, 2), 1, multiply(@n, _fact(subtract(@n, 1))))
    let body = call(
        "return",
        vec![call(
            "if",
            vec![
                call("lt", vec![var("@n"), ParseTree::int(2)]),
                ParseTree::int(1),
                call(
                    "multiply",
                    vec![
                        var("@n"),
                        call("_fact", vec![call("subtract", vec![var("@n"), ParseTree::int(1)])]),
                    ],
                ),
            ],
        )],
    );
    let tree = program(vec![
        proc("_fact", vec![var("@n"), body]),
        call("_fact", vec![call("dyn", vec![ParseTree::int(5)])]),
    ]);
    assert_eq!(eval_program(tree).unwrap(), Value::Int(120));
}

// ═══════════════════════════════════════════════════════════════════════
// Closures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_execute_closure() {
    let tree = program(vec![
        assign("@base", ParseTree::int(40)),
        assign(
            "@f",
            call(
                "closure",
                vec![
                    var("@x"),
                    call("return", vec![call("add", vec![var("@base"), var("@x")])]),
                ],
            ),
        ),
        call("execute", vec![ParseTree::int(2), var("@f")]),
    ]);
    assert_eq!(eval_program(tree).unwrap(), Value::Int(42));
}

#[test]
fn test_closure_assignments_do_not_leak() {
    let tree = program(vec![
        assign("@x", ParseTree::int(1)),
        assign(
            "@f",
            call("closure", vec![assign("@x", ParseTree::int(99))]),
        ),
        call("execute", vec![var("@f")]),
        var("@x"),
    ]);
    assert_eq!(eval_program(tree).unwrap(), Value::Int(1));
}

#[test]
fn test_execute_requires_closure() {
    let tree = call("execute", vec![call("dyn", vec![ParseTree::int(3)])]);
    let err = eval_program(tree).unwrap_err();
    assert!(matches!(err, ThicketError::Eval(EvalError::TypeError { .. })));
}

// ═══════════════════════════════════════════════════════════════════════
// Context
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_interrupted_context_stops_evaluation() {
    let ctx = EvalContext::new();
    ctx.interrupt();
    let mut env = Environment::new();
    let err = run(&ParseTree::int(1), &mut env, &ctx).unwrap_err();
    assert!(matches!(err, EvalError::Interrupted));

    ctx.reset_interrupt();
    assert_eq!(run(&ParseTree::int(1), &mut env, &ctx).unwrap(), Value::Int(1));
}

#[test]
fn test_run_reports_errors_to_reaction() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = EvalContext::new().with_reaction(move |err| sink.lock().push(err.to_string()));
    let mut env = Environment::new();

    assert!(run(&var("@nope"), &mut env, &ctx).is_err());
    assert_eq!(seen.lock().len(), 1);
    assert!(seen.lock()[0].contains("@nope"));
}

#[test]
fn test_top_level_return_ends_program() {
    let (mut env, lines) = captured();
    let tree = program(vec![
        call("return", vec![ParseTree::int(7)]),
        call("msg", vec![ParseTree::string("unreachable")]),
    ]);
    let result = compile_and_run(tree, &mut env, &EvalContext::new()).unwrap();
    assert_eq!(result, Value::Int(7));
    assert!(lines.lock().is_empty());
}
