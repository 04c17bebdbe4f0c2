//! Runtime error taxonomy, positions and recovery

use microscript::*;

fn eval_error(src: &str) -> EvalError {
    eval_error_with(EvalContext::default(), src)
}

fn eval_error_with(ctx: EvalContext, src: &str) -> EvalError {
    let mut interp = Interpreter::new(ctx);
    let mut out = String::new();
    match interp.run(src, &mut out) {
        Err(MicroScriptError::Eval(err)) => err,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Name Resolution
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unbound_name_prints_nothing() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    let err = interp.run("print(z)", &mut out).unwrap_err();
    assert!(out.is_empty());
    assert_eq!(
        err,
        MicroScriptError::Eval(EvalError::UndefinedVariable {
            name: "z".to_string(),
            pos: Some(Position::new(1, 7)),
        })
    );
    assert_eq!(err.position(), Some(Position::new(1, 7)));
}

#[test]
fn test_unbound_function_name() {
    let err = eval_error("x = nope(1)");
    assert!(matches!(err, EvalError::UndefinedVariable { ref name, .. } if name == "nope"));
}

#[test]
fn test_calling_a_non_function() {
    let err = eval_error("x = 3\nx(1)");
    assert_eq!(
        err,
        EvalError::NotCallable {
            name: "x".to_string(),
            type_name: "int".to_string(),
            pos: Some(Position::new(2, 1)),
        }
    );
    assert_eq!(
        err.to_string(),
        "'x' is not callable: it is a int (line 2, col 1)"
    );
}

#[test]
fn test_arguments_evaluate_before_callee_check() {
    let err = eval_error("x = 3\nx(missing)");
    assert!(matches!(err, EvalError::UndefinedVariable { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Assignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_assign_to_literal() {
    let err = eval_error("1 = 2");
    assert_eq!(
        err,
        EvalError::InvalidAssignTarget {
            kind: "number literal".to_string(),
            pos: Some(Position::new(1, 1)),
        }
    );
}

#[test]
fn test_assign_to_call_evaluates_value_first() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    let src = "\
def f(): return 1
def g():
    print(\"value\")
    return 2
f() = g()";
    let err = interp.run(src, &mut out).unwrap_err();
    assert_eq!(out, "value\n");
    assert!(matches!(
        err,
        MicroScriptError::Eval(EvalError::InvalidAssignTarget { ref kind, .. }) if kind == "function call"
    ));
}

#[test]
fn test_string_item_assignment() {
    let err = eval_error("s = \"abc\"\ns[0] = \"x\"");
    assert!(matches!(err, EvalError::IndexError { .. }));
    assert!(err.to_string().contains("does not support item assignment"));
}

// ═══════════════════════════════════════════════════════════════════════
// Calls
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_user_function_arity() {
    let err = eval_error("def f(a, b): return a\nf(1)");
    assert_eq!(
        err,
        EvalError::ArityMismatch {
            name: "f".to_string(),
            expected: "2".to_string(),
            got: 1,
            pos: Some(Position::new(2, 1)),
        }
    );
    assert_eq!(
        err.to_string(),
        "f() takes 2 argument(s) but 1 were given (line 2, col 1)"
    );
}

#[test]
fn test_builtin_arity_range() {
    let err = eval_error("range()");
    assert_eq!(
        err.to_string(),
        "range() takes 1 to 3 argument(s) but 0 were given (line 1, col 1)"
    );
}

#[test]
fn test_builtin_failure() {
    let err = eval_error("x = int(\"abc\")");
    assert!(matches!(err, EvalError::BuiltinError { ref name, .. } if name == "int"));
    assert_eq!(err.position(), Some(Position::new(1, 5)));
}

#[test]
fn test_arity_failure_pushes_no_frame() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    interp.run("def f(a): return a\nf()", &mut out).unwrap_err();
    assert_eq!(interp.runtime().call_depth(), 0);
}

// ═══════════════════════════════════════════════════════════════════════
// Resource Limits
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_runaway_while_loop() {
    let ctx = EvalContext::new().with_max_loop_iterations(100);
    let err = eval_error_with(ctx, "x = 0\nwhile true:\n    x = x + 1");
    assert_eq!(
        err,
        EvalError::LoopLimit {
            limit: 100,
            pos: Some(Position::new(2, 1)),
        }
    );
}

#[test]
fn test_loop_may_reach_the_limit_exactly() {
    let ctx = EvalContext::new().with_max_loop_iterations(5);
    let mut interp = Interpreter::new(ctx);
    let mut out = String::new();
    interp
        .run("i = 0\nwhile i < 5:\n    i = i + 1\nprint(i)", &mut out)
        .unwrap();
    assert_eq!(out, "5\n");
}

#[test]
fn test_for_loops_are_not_limited() {
    let ctx = EvalContext::new().with_max_loop_iterations(3);
    let mut interp = Interpreter::new(ctx);
    let mut out = String::new();
    interp
        .run("n = 0\nfor i in range(10):\n    n = n + 1\nprint(n)", &mut out)
        .unwrap();
    assert_eq!(out, "10\n");
}

#[test]
fn test_unbounded_recursion() {
    let ctx = EvalContext::new().with_max_call_depth(50);
    let err = eval_error_with(ctx, "def f(n): return f(n + 1)\nf(0)");
    assert!(matches!(err, EvalError::RecursionLimit { max: 50, .. }));
    assert_eq!(err.position(), Some(Position::new(1, 18)));
}

#[test]
fn test_recursion_within_limit() {
    let ctx = EvalContext::new().with_max_call_depth(50);
    let mut interp = Interpreter::new(ctx);
    let mut out = String::new();
    interp
        .run(
            "def down(n):\n    if n == 0: return 0\n    return down(n - 1)\nprint(down(49))",
            &mut out,
        )
        .unwrap();
    assert_eq!(out, "0\n");
}

#[test]
fn test_recursion_inside_expressions_at_default_depth() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    interp
        .run(
            "def f(n):\n    if n == 0: return 0\n    return 1 + f(n - 1) * 1\nprint(f(199))",
            &mut out,
        )
        .unwrap();
    assert_eq!(out, "199\n");
}

#[test]
fn test_nested_expression_recursion_hits_the_limit() {
    let err = eval_error(
        "def f(n):\n    if n == 0: return 0\n    return 1 + (2 * (f(n - 1) + 0)) - 1\nf(500)",
    );
    assert!(matches!(
        err,
        EvalError::RecursionLimit {
            max: context::DEFAULT_MAX_CALL_DEPTH,
            ..
        }
    ));
}

#[test]
fn test_deep_recursion_with_raised_limit() {
    let ctx = EvalContext::new().with_max_call_depth(5000);
    let mut interp = Interpreter::new(ctx);
    let mut out = String::new();
    interp
        .run(
            "def f(n):\n    if n == 0: return 0\n    return 1 + f(n - 1)\nprint(f(4000))",
            &mut out,
        )
        .unwrap();
    assert_eq!(out, "4000\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Recovery and Formatting
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_output_before_error_is_kept() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    interp
        .run("print(1)\nprint(2)\nprint(1 / 0)\nprint(3)", &mut out)
        .unwrap_err();
    assert_eq!(out, "1\n2\n");
}

#[test]
fn test_frames_survive_error_for_inspection() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    let src = "\
def outer(x): return inner(x)
def inner(y): return y / 0
outer(4)";
    interp.run(src, &mut out).unwrap_err();

    let frames = interp.runtime().callstack_snapshot();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].function, "inner");
    assert_eq!(frames[0].locals.get("y"), Some(&Value::Int(4)));
    assert_eq!(frames[1].function, "outer");
    assert_eq!(frames[1].line, Some(3));
}

#[test]
fn test_format_error_prefixes_filename() {
    let err = run("print(q)").unwrap_err();
    assert_eq!(
        format_error(&err, "demo.ms"),
        "demo.ms: runtime error: name 'q' is not defined (line 1, col 7)"
    );

    let err = run("x = = 1").unwrap_err();
    assert_eq!(
        format_error(&err, "demo.ms"),
        "demo.ms: parse error: expected an expression, found operator '=' (line 1, col 5)"
    );
}
