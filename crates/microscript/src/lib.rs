//! # MicroScript
//!
//! A small dynamically-typed scripting language with a resumable debugger.
//!
//! Source text flows through a fixed pipeline:
//!
//! - **Lexer**: [`tokenize`] turns source into positioned [`Token`]s
//! - **Parser**: [`parse`] builds a [`Program`] by recursive descent;
//!   blocks are recovered from token columns
//! - **Runtime**: [`Runtime`] holds scopes ([`Env`]), the call stack and
//!   breakpoints
//! - **Evaluator**: [`Evaluator`] walks the tree; a breakpoint or step
//!   pauses it and the next call resumes at the same statement
//! - **Debugger**: [`Debugger`] drives the evaluator with breakpoints and
//!   stepping and exposes variables and frames for inspection
//!
//! [`Interpreter`] and [`run`] wrap the pipeline for batch and REPL use.
//!
//! ```
//! let out = microscript::run("def add(a, b): return a + b\nprint(add(2, 3))").unwrap();
//! assert_eq!(out, "5\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod context;
pub mod debugger;
pub mod environment;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod position;
pub mod runtime;
mod stack;
pub mod value;

// Re-export main types
pub use ast::{BinaryOp, Expr, FunctionDef, IfStmt, Number, Program, Stmt, UnaryOp};
pub use context::EvalContext;
pub use debugger::{DebugState, Debugger, RunStatus};
pub use environment::{default_builtins, Env};
pub use error::{
    format_error, EnvironmentError, EvalError, LexError, MicroScriptError, ParseError, Result,
};
pub use eval::{Evaluator, Outcome};
pub use interpreter::{run, Interpreter};
pub use lexer::{tokenize, Token, TokenKind};
pub use output::{OutputSink, SilentSink, StdoutSink};
pub use parser::parse;
pub use position::Position;
pub use runtime::{BreakpointTable, CallStack, Frame, FrameInfo, Runtime};
pub use value::{Arity, BuiltinFn, HashableValue, UserFunction, Value};

/// MicroScript version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_pipeline_example() {
        let tokens = tokenize("x = 2\ny = x + 3\nprint(y)").unwrap();
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));

        let program = parse(&tokens).unwrap();
        assert_eq!(program.len(), 3);

        assert_eq!(run("x = 2\ny = x + 3\nprint(y)").unwrap(), "5\n");
    }
}
