//! Callable value types: user functions and builtins

use std::fmt;
use std::rc::Rc;

use super::Value;
use crate::ast::{FunctionDef, Stmt};
use crate::environment::Env;

/// Type alias for builtin function pointers
pub type BuiltinFnPtr = Rc<dyn Fn(&[Value]) -> Result<Value, String>>;

/// A function defined with `def`.
///
/// The closure environment is the scope that was active when the `def`
/// statement ran. It is held by reference, so later assignments in that
/// scope are visible to the function body.
pub struct UserFunction {
    /// The definition this function was created from
    pub def: Rc<FunctionDef>,

    /// Defining scope
    pub closure_env: Env,
}

impl UserFunction {
    /// Create a function value from its definition and defining scope.
    pub fn new(def: Rc<FunctionDef>, closure_env: Env) -> Self {
        Self { def, closure_env }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Parameter names
    pub fn params(&self) -> &[String] {
        &self.def.params
    }

    /// Function body
    pub fn body(&self) -> &[Stmt] {
        &self.def.body
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserFunction({}/{})", self.def.name, self.def.params.len())
    }
}

/// Accepted argument counts of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive
    Between(usize, usize),
    /// `min` or more arguments
    AtLeast(usize),
}

impl Arity {
    /// Check whether `count` arguments are acceptable.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// A built-in native function.
///
/// Builtins see only their evaluated arguments; they cannot call back into
/// the evaluator. A failure is reported as a message and surfaced to the
/// program as a runtime error naming the builtin.
#[derive(Clone)]
pub struct BuiltinFn {
    /// Function name (for display and diagnostics)
    pub name: String,

    /// Accepted argument counts
    pub arity: Arity,

    /// The native implementation
    pub func: BuiltinFnPtr,
}

impl BuiltinFn {
    /// Create a builtin from a native function.
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    /// Invoke the native implementation.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFn({})", self.name)
    }
}
