//! Batch and REPL front door: source text in, output out

use crate::context::EvalContext;
use crate::error::{EvalError, MicroScriptError, Result};
use crate::eval::{Evaluator, Outcome};
use crate::lexer::tokenize;
use crate::output::OutputSink;
use crate::parser::parse;
use crate::runtime::Runtime;

/// Runs source snippets against persistent globals.
///
/// Each [`Interpreter::run`] lexes, parses and evaluates one snippet. Global
/// bindings carry over from one call to the next, which is what a REPL
/// needs; frames left behind by a failed call are dropped first.
///
/// # Example
///
/// ```
/// use microscript::{EvalContext, Interpreter};
///
/// let mut interp = Interpreter::new(EvalContext::new());
/// let mut out = String::new();
/// interp.run("def sq(n): return n * n", &mut out).unwrap();
/// interp.run("print(sq(9))", &mut out).unwrap();
/// assert_eq!(out, "81\n");
/// ```
#[derive(Debug)]
pub struct Interpreter {
    runtime: Runtime,
    evaluator: Evaluator,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(EvalContext::default())
    }
}

impl Interpreter {
    /// Create an interpreter with fresh globals.
    pub fn new(ctx: EvalContext) -> Self {
        Self {
            runtime: Runtime::new(&ctx),
            evaluator: Evaluator::new(ctx),
        }
    }

    /// Lex, parse and evaluate `source`, writing `print` output to `out`.
    ///
    /// # Errors
    ///
    /// Lex and parse errors abort before anything runs. A runtime error
    /// stops the snippet; bindings made before it are kept.
    pub fn run(&mut self, source: &str, out: &mut dyn OutputSink) -> Result<()> {
        let tokens = tokenize(source)?;
        let program = parse(&tokens)?;

        self.runtime.reset_call_stack();
        self.evaluator.discard_suspended();
        match self.evaluator.evaluate(&program, &mut self.runtime, out)? {
            Outcome::Finished => Ok(()),
            Outcome::Paused(pos) => Err(MicroScriptError::Eval(EvalError::Internal(format!(
                "unexpected pause at {pos}"
            )))),
        }
    }

    /// The runtime holding the persistent globals.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

/// Run a complete program in a fresh interpreter and return its output.
///
/// ```
/// assert_eq!(microscript::run("x = 2\ny = x + 3\nprint(y)").unwrap(), "5\n");
/// ```
///
/// # Errors
///
/// The first lex, parse or runtime error.
pub fn run(source: &str) -> Result<String> {
    let mut out = String::new();
    Interpreter::default().run(source, &mut out)?;
    Ok(out)
}
