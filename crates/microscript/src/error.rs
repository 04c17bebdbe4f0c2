//! Error types for lexing, parsing and evaluation

use std::fmt;

use thiserror::Error;

use crate::position::Position;
use crate::value::Value;

/// Main error type covering every phase of running a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MicroScriptError {
    /// Source text could not be tokenized
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    /// Token stream could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Evaluation failed
    #[error("runtime error: {0}")]
    Eval(#[from] EvalError),
}

impl MicroScriptError {
    /// Where the error was detected, if known.
    pub fn position(&self) -> Option<Position> {
        match self {
            MicroScriptError::Lex(e) => Some(e.position()),
            MicroScriptError::Parse(e) => Some(e.pos),
            MicroScriptError::Eval(e) => e.position(),
        }
    }
}

/// Result type alias for whole-program operations
pub type Result<T> = std::result::Result<T, MicroScriptError>;

/// Render an error for a user, prefixed with the source name.
pub fn format_error(err: &dyn fmt::Display, filename: &str) -> String {
    format!("{}: {}", filename, err)
}

/// Formats an optional position as ` (line L, col C)`.
struct At<'a>(&'a Option<Position>);

impl fmt::Display for At<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(pos) => write!(f, " ({})", pos),
            None => Ok(()),
        }
    }
}

fn at(pos: &Option<Position>) -> At<'_> {
    At(pos)
}

// ═══════════════════════════════════════════════════════════════════════
// Lexing and Parsing
// ═══════════════════════════════════════════════════════════════════════

/// Error raised by the lexer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that starts no token
    #[error("unexpected character {ch:?} ({pos})")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Where it was found
        pos: Position,
    },

    /// A string literal missing its closing quote
    #[error("unterminated string literal ({pos})")]
    UnterminatedString {
        /// Where the literal starts
        pos: Position,
    },
}

impl LexError {
    /// Where the error was detected.
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { pos, .. } | LexError::UnterminatedString { pos } => *pos,
        }
    }
}

/// Error raised by the parser. The first error aborts parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({pos})")]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,

    /// Source location of the offending token
    pub pos: Position,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Runtime
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised by environment and call-stack operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// Lookup of a name bound nowhere in the scope chain
    #[error("name '{name}' is not defined")]
    UndefinedVariable {
        /// The unbound name
        name: String,
    },

    /// Function called with the wrong number of arguments
    #[error("{name}() takes {expected} argument(s) but {got} were given")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Call depth limit reached
    #[error("maximum recursion depth exceeded ({depth} >= {max})")]
    RecursionLimit {
        /// Current depth
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// Pop from an empty call stack (engine bug)
    #[error("cannot leave a function: call stack is empty")]
    EmptyCallStack,
}

/// Errors raised during evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Unbound variable or function name
    #[error("name '{name}' is not defined{}", at(.pos))]
    UndefinedVariable {
        /// The unbound name
        name: String,
        /// Where it was referenced
        pos: Option<Position>,
    },

    /// Call of a value that is not a function
    #[error("'{name}' is not callable: it is a {type_name}{}", at(.pos))]
    NotCallable {
        /// The callee name
        name: String,
        /// Type of the bound value
        type_name: String,
        /// Call site
        pos: Option<Position>,
    },

    /// Assignment to something other than a name or an index
    #[error("cannot assign to {kind}{}", at(.pos))]
    InvalidAssignTarget {
        /// What was on the left of `=`
        kind: String,
        /// Assignment site
        pos: Option<Position>,
    },

    /// Failed index read or write
    #[error("index error: {message}{}", at(.pos))]
    IndexError {
        /// The underlying failure
        message: String,
        /// Index site
        pos: Option<Position>,
    },

    /// Operand or argument of the wrong type
    #[error("type error: {message}{}", at(.pos))]
    TypeError {
        /// What went wrong
        message: String,
        /// Where
        pos: Option<Position>,
    },

    /// Division by zero, integer overflow and similar
    #[error("arithmetic error: {message}{}", at(.pos))]
    ArithmeticError {
        /// What went wrong
        message: String,
        /// Where
        pos: Option<Position>,
    },

    /// Function called with the wrong number of arguments
    #[error("{name}() takes {expected} argument(s) but {got} were given{}", at(.pos))]
    ArityMismatch {
        /// Function name
        name: String,
        /// Accepted argument count, e.g. `2` or `1 to 3`
        expected: String,
        /// Supplied argument count
        got: usize,
        /// Call site
        pos: Option<Position>,
    },

    /// A `while` loop exceeded the iteration ceiling
    #[error("infinite loop detected: more than {limit} iterations{}", at(.pos))]
    LoopLimit {
        /// Configured ceiling
        limit: usize,
        /// The loop statement
        pos: Option<Position>,
    },

    /// Call depth limit reached
    #[error("maximum recursion depth of {max} exceeded{}", at(.pos))]
    RecursionLimit {
        /// Configured maximum
        max: usize,
        /// Call site
        pos: Option<Position>,
    },

    /// A native builtin reported a failure
    #[error("{name}(): {message}{}", at(.pos))]
    BuiltinError {
        /// Builtin name
        name: String,
        /// Failure reported by the builtin
        message: String,
        /// Call site
        pos: Option<Position>,
    },

    /// The call stack was popped while empty
    #[error("call stack underflow")]
    CallStackUnderflow,

    /// A debugger operation needs a loaded program
    #[error("no program loaded")]
    NoProgramLoaded,

    /// Broken interpreter invariant
    #[error("internal interpreter error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Where the error was detected, if known.
    pub fn position(&self) -> Option<Position> {
        match self {
            EvalError::UndefinedVariable { pos, .. }
            | EvalError::NotCallable { pos, .. }
            | EvalError::InvalidAssignTarget { pos, .. }
            | EvalError::IndexError { pos, .. }
            | EvalError::TypeError { pos, .. }
            | EvalError::ArithmeticError { pos, .. }
            | EvalError::ArityMismatch { pos, .. }
            | EvalError::LoopLimit { pos, .. }
            | EvalError::RecursionLimit { pos, .. }
            | EvalError::BuiltinError { pos, .. } => *pos,
            EvalError::CallStackUnderflow | EvalError::NoProgramLoaded | EvalError::Internal(_) => {
                None
            }
        }
    }

    /// Attach a position if the error does not carry one yet.
    pub fn at(mut self, at: Position) -> Self {
        match &mut self {
            EvalError::UndefinedVariable { pos, .. }
            | EvalError::NotCallable { pos, .. }
            | EvalError::InvalidAssignTarget { pos, .. }
            | EvalError::IndexError { pos, .. }
            | EvalError::TypeError { pos, .. }
            | EvalError::ArithmeticError { pos, .. }
            | EvalError::ArityMismatch { pos, .. }
            | EvalError::LoopLimit { pos, .. }
            | EvalError::RecursionLimit { pos, .. }
            | EvalError::BuiltinError { pos, .. } => {
                pos.get_or_insert(at);
            }
            EvalError::CallStackUnderflow | EvalError::NoProgramLoaded | EvalError::Internal(_) => {
            }
        }
        self
    }

    /// Shorthand for a positioned type error.
    pub fn type_error(message: impl Into<String>, pos: Option<Position>) -> Self {
        EvalError::TypeError {
            message: message.into(),
            pos,
        }
    }

    /// Shorthand for a positioned index error.
    pub fn index_error(message: impl Into<String>, pos: Option<Position>) -> Self {
        EvalError::IndexError {
            message: message.into(),
            pos,
        }
    }

    /// Shorthand for a positioned arithmetic error.
    pub fn arithmetic(message: impl Into<String>, pos: Option<Position>) -> Self {
        EvalError::ArithmeticError {
            message: message.into(),
            pos,
        }
    }
}

impl From<EnvironmentError> for EvalError {
    fn from(err: EnvironmentError) -> Self {
        match err {
            EnvironmentError::UndefinedVariable { name } => {
                EvalError::UndefinedVariable { name, pos: None }
            }
            EnvironmentError::ArityMismatch {
                name,
                expected,
                got,
            } => EvalError::ArityMismatch {
                name,
                expected: expected.to_string(),
                got,
                pos: None,
            },
            EnvironmentError::RecursionLimit { max, .. } => {
                EvalError::RecursionLimit { max, pos: None }
            }
            EnvironmentError::EmptyCallStack => EvalError::CallStackUnderflow,
        }
    }
}

/// Get the user-facing type name of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "string",
        Value::Array(_) => "array",
        Value::Dict(_) => "dict",
        Value::Function(_) => "function",
        Value::Builtin(_) => "builtin",
    }
}
