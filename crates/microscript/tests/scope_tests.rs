//! Scoping: environment chains, closures and frame-local bindings

use microscript::*;

fn output(src: &str) -> String {
    match run(src) {
        Ok(out) => out,
        Err(err) => panic!("program failed: {err}"),
    }
}

/// Run `src`, returning what it printed before failing and the error.
fn output_and_error(src: &str) -> (String, EvalError) {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    match interp.run(src, &mut out) {
        Err(MicroScriptError::Eval(err)) => (out, err),
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Closures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_closure_sees_later_mutation() {
    let src = "\
x = 1
def f(): return x
x = 2
print(f())";
    assert_eq!(output(src), "2\n");
}

#[test]
fn test_closure_counter() {
    let src = "\
def make_counter():
    n = 0
    def inc():
        n = n + 1
        return n
    return inc
c = make_counter()
c()
print(c())
d = make_counter()
print(d())
print(c())";
    assert_eq!(output(src), "2\n1\n3\n");
}

#[test]
fn test_closures_in_loop_share_the_final_binding() {
    let src = "\
fs = []
for i in [1, 2, 3]:
    def get(): return i
    push(fs, get)
f = fs[0]
print(f())";
    assert_eq!(output(src), "3\n");
}

#[test]
fn test_scoping_is_lexical_not_dynamic() {
    let src = "\
def inner(): return secret
def outer():
    secret = 1
    return inner()
print(outer())";
    let (out, err) = output_and_error(src);
    assert_eq!(out, "");
    assert!(matches!(err, EvalError::UndefinedVariable { ref name, .. } if name == "secret"));
}

#[test]
fn test_mutual_recursion_resolves_at_call_time() {
    let src = "\
def is_even(n):
    if n == 0: return true
    return is_odd(n - 1)
def is_odd(n):
    if n == 0: return false
    return is_even(n - 1)
print(is_even(10))
print(is_odd(7))";
    assert_eq!(output(src), "true\ntrue\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Assignment Resolution
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_assignment_in_function_mutates_global() {
    let src = "\
count = 0
def bump():
    count = count + 1
bump()
bump()
print(count)";
    assert_eq!(output(src), "2\n");
}

#[test]
fn test_new_name_in_function_stays_local() {
    let src = "\
def f():
    tmp = 5
    return tmp
print(f())
print(tmp)";
    let (out, err) = output_and_error(src);
    assert_eq!(out, "5\n");
    assert_eq!(err.to_string(), "name 'tmp' is not defined (line 5, col 7)");
}

#[test]
fn test_parameters_shadow_globals() {
    let src = "\
a = 1
def f(a):
    a = a + 10
    return a
print(f(5))
print(a)";
    assert_eq!(output(src), "15\n1\n");
}

#[test]
fn test_each_call_gets_its_own_frame() {
    let src = "\
def f(n):
    if n == 0:
        return 0
    x = n
    f(n - 1)
    return x
print(f(3))";
    assert_eq!(output(src), "3\n");
}

// ═══════════════════════════════════════════════════════════════════════
// Blocks Share Their Enclosing Scope
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_if_body_binding_is_visible_after() {
    assert_eq!(output("if true:\n    y = 3\nprint(y)"), "3\n");
}

#[test]
fn test_while_body_binding_is_visible_after() {
    let src = "\
i = 0
while i < 2:
    last = i
    i = i + 1
print(last)";
    assert_eq!(output(src), "1\n");
}

#[test]
fn test_loop_variable_outlives_loop() {
    let src = "\
for i in [1, 2, 3]:
    seen = i
print(i)";
    assert_eq!(output(src), "3\n");
}

#[test]
fn test_loop_variable_reuses_existing_binding() {
    let src = "\
i = 100
def f():
    for i in [7, 8]:
        x = i
f()
print(i)";
    assert_eq!(output(src), "8\n");
}

#[test]
fn test_globals_visible_through_runtime() {
    let mut interp = Interpreter::default();
    let mut out = String::new();
    interp
        .run("x = 1\ndef f(): return 2\nif x: y = f()", &mut out)
        .unwrap();

    let vars = interp.runtime().variables_snapshot();
    assert_eq!(vars.get("x"), Some(&Value::Int(1)));
    assert_eq!(vars.get("y"), Some(&Value::Int(2)));
    assert!(matches!(vars.get("f"), Some(Value::Function(_))));
    assert!(!vars.contains_key("len"));
}
