//! Control flow signals threaded through statement execution

use crate::error::EvalError;
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    /// Fall through to the next statement
    Normal,

    /// `return` was executed; unwinds to the enclosing call
    Return(Value),
}

/// Why evaluation stopped early.
///
/// `Pause` is not a failure: the levels it unwinds through record their
/// progress on the resume stack so the next run can pick up where this one
/// stopped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
    /// A before-statement hook asked to pause
    Pause,

    /// Evaluation failed
    Error(EvalError),
}

impl From<EvalError> for Signal {
    fn from(err: EvalError) -> Self {
        Signal::Error(err)
    }
}

impl From<crate::error::EnvironmentError> for Signal {
    fn from(err: crate::error::EnvironmentError) -> Self {
        Signal::Error(err.into())
    }
}
