//! Resume records for paused evaluations
//!
//! When a pause unwinds the evaluator, every level between the paused
//! statement and the program pushes one record describing its progress.
//! The innermost level pushes first, so the outermost record ends up on
//! top: on the next run each level pops its own record on the way back
//! down. A level is resuming exactly when the stack is non-empty on entry.

use std::fmt;
use std::rc::Rc;

use crate::error::EvalError;
use crate::value::{UserFunction, Value};

/// Progress of one evaluation level at the moment of a pause.
#[derive(Debug, Clone)]
pub(crate) enum Resume {
    /// Statement `index` of a block is the one paused at or inside
    Block { index: usize },

    /// Arm `arm` of an `if` (`arm_count` for `else`), paused in its
    /// condition or its body
    If { arm: usize, in_body: bool },

    /// A `while` paused in its condition or body after `iterations` passes
    While { iterations: usize, in_body: bool },

    /// A `for` loop
    For(ForState),

    /// Operands already evaluated by the construct being resumed
    Operands(Vec<Value>),

    /// A function call
    Call(CallState),
}

#[derive(Debug, Clone)]
pub(crate) enum ForState {
    /// Paused while evaluating the iterable
    Iterable,

    /// Paused in the body for `items[next]`
    Body { items: Vec<Value>, next: usize },
}

#[derive(Debug, Clone)]
pub(crate) enum CallState {
    /// Paused while evaluating arguments; the callee is already resolved
    Args { callee: Value },

    /// Paused inside the body; its frame is still on the call stack
    Body { function: Rc<UserFunction> },
}

impl fmt::Display for Resume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Resume::Block { .. } => "block",
            Resume::If { .. } => "if",
            Resume::While { .. } => "while",
            Resume::For(_) => "for",
            Resume::Operands(_) => "operands",
            Resume::Call(_) => "call",
        };
        f.write_str(kind)
    }
}

/// Stack of resume records owned by an evaluator between runs.
#[derive(Debug, Default)]
pub(crate) struct ResumeStack {
    records: Vec<Resume>,
}

impl ResumeStack {
    pub fn push(&mut self, record: Resume) {
        self.records.push(record);
    }

    pub fn is_resuming(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Pop the top record if resuming. A record of the wrong kind means
    /// the program changed under a paused evaluation.
    fn take<T>(
        &mut self,
        expected: &str,
        extract: impl FnOnce(Resume) -> Result<T, Resume>,
    ) -> Result<Option<T>, EvalError> {
        let Some(record) = self.records.pop() else {
            return Ok(None);
        };
        extract(record).map(Some).map_err(|found| {
            EvalError::Internal(format!(
                "resume mismatch: expected {expected} record, found {found}"
            ))
        })
    }

    pub fn take_block(&mut self) -> Result<Option<usize>, EvalError> {
        self.take("block", |record| match record {
            Resume::Block { index } => Ok(index),
            other => Err(other),
        })
    }

    pub fn take_if(&mut self) -> Result<Option<(usize, bool)>, EvalError> {
        self.take("if", |record| match record {
            Resume::If { arm, in_body } => Ok((arm, in_body)),
            other => Err(other),
        })
    }

    pub fn take_while(&mut self) -> Result<Option<(usize, bool)>, EvalError> {
        self.take("while", |record| match record {
            Resume::While {
                iterations,
                in_body,
            } => Ok((iterations, in_body)),
            other => Err(other),
        })
    }

    pub fn take_for(&mut self) -> Result<Option<ForState>, EvalError> {
        self.take("for", |record| match record {
            Resume::For(state) => Ok(state),
            other => Err(other),
        })
    }

    pub fn take_operands(&mut self) -> Result<Option<Vec<Value>>, EvalError> {
        self.take("operands", |record| match record {
            Resume::Operands(values) => Ok(values),
            other => Err(other),
        })
    }

    pub fn take_call(&mut self) -> Result<Option<CallState>, EvalError> {
        self.take("call", |record| match record {
            Resume::Call(state) => Ok(state),
            other => Err(other),
        })
    }
}
