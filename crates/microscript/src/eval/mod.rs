//! Tree-walking evaluation
//!
//! Expressions implement [`Evaluate`] and statements implement [`Execute`],
//! both dispatching with an exhaustive match on the node kind. Each construct
//! lives in its own module.
//!
//! Evaluation can stop in the middle of a program when the before-statement
//! hook asks for a pause. The levels it unwinds through leave resume records
//! behind (see the `resume` module), and the next call to [`Evaluator::evaluate`]
//! continues from the paused statement instead of starting over.

mod assign;
pub(crate) mod binary;
mod call;
mod control;
mod function;
mod if_stmt;
mod index;
mod literal;
mod loops;
mod resume;
mod return_stmt;
mod stmt;
mod unary;

pub(crate) use control::{Flow, Signal};
use literal::unquote;
use resume::{Resume, ResumeStack};

use crate::ast::{Expr, Program, Stmt};
use crate::context::EvalContext;
use crate::error::EvalError;
use crate::output::OutputSink;
use crate::position::Position;
use crate::runtime::Runtime;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Result of one [`Evaluator::evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The program ran to completion
    Finished,

    /// A breakpoint or step stopped the program before the statement at
    /// this position; evaluate again to continue
    Paused(Position),
}

/// Evaluates programs against a [`Runtime`], remembering where a paused
/// program stopped.
///
/// # Example
///
/// ```
/// use microscript::{parse, tokenize, EvalContext, Evaluator, Outcome, Runtime};
///
/// let program = parse(&tokenize("x = 6 * 7\nprint(x)").unwrap()).unwrap();
/// let ctx = EvalContext::new();
/// let mut runtime = Runtime::new(&ctx);
/// let mut evaluator = Evaluator::new(ctx);
///
/// let mut out = String::new();
/// let outcome = evaluator.evaluate(&program, &mut runtime, &mut out).unwrap();
/// assert_eq!(outcome, Outcome::Finished);
/// assert_eq!(out, "42\n");
/// ```
#[derive(Debug, Default)]
pub struct Evaluator {
    ctx: EvalContext,
    resume: ResumeStack,
}

impl Evaluator {
    /// Create an evaluator with the given limits.
    pub fn new(ctx: EvalContext) -> Self {
        Self {
            ctx,
            resume: ResumeStack::default(),
        }
    }

    /// The evaluation configuration.
    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    /// True while a paused program is waiting to be resumed.
    pub fn is_suspended(&self) -> bool {
        self.resume.is_resuming()
    }

    /// Forget a paused program so the next evaluation starts from the top.
    pub fn discard_suspended(&mut self) {
        self.resume.clear();
    }

    /// Run `program`, or continue it if it paused last time.
    ///
    /// `print` output goes to `out`. Bindings and frames live in `rt` and
    /// survive both pauses and errors, so they can be inspected afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error. A failed run is not resumable.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(
        &mut self,
        program: &Program,
        rt: &mut Runtime,
        out: &mut dyn OutputSink,
    ) -> Result<Outcome, EvalError> {
        let mut exec = Exec {
            rt: &mut *rt,
            ctx: &self.ctx,
            out,
            resume: &mut self.resume,
        };
        let result = exec.exec_block(&program.statements);

        match result {
            Ok(Flow::Normal) => {
                rt.clear_pause();
                tracing::debug!("program finished");
                Ok(Outcome::Finished)
            }
            Ok(Flow::Return(_)) => {
                self.resume.clear();
                Err(EvalError::Internal(
                    "return escaped to program level".to_string(),
                ))
            }
            Err(Signal::Pause) => {
                let pos = rt.pause_position().unwrap_or_default();
                tracing::debug!(
                    line = pos.line,
                    column = pos.column,
                    records = self.resume.len(),
                    "program paused"
                );
                Ok(Outcome::Paused(pos))
            }
            Err(Signal::Error(err)) => {
                self.resume.clear();
                tracing::debug!(error = %err, "program failed");
                Err(err)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Execution State
// ═══════════════════════════════════════════════════════════════════════

/// Everything a construct needs while it runs.
pub(crate) struct Exec<'a> {
    pub rt: &'a mut Runtime,
    pub ctx: &'a EvalContext,
    pub out: &'a mut dyn OutputSink,
    resume: &'a mut ResumeStack,
}

impl Exec<'_> {
    /// Record `record` if `result` is a pause unwinding through the caller.
    pub fn suspend<T>(
        &mut self,
        result: Result<T, Signal>,
        record: impl FnOnce() -> Resume,
    ) -> Result<T, Signal> {
        if let Err(Signal::Pause) = &result {
            self.resume.push(record());
        }
        result
    }

    /// Run the statements of a block, calling the before-statement hook
    /// ahead of each one.
    pub fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, Signal> {
        ensure_sufficient_stack(|| self.exec_statements(stmts))
    }

    fn exec_statements(&mut self, stmts: &[Stmt]) -> Result<Flow, Signal> {
        let start = self.resume.take_block()?;
        if let Some(index) = start {
            if index >= stmts.len() {
                return Err(EvalError::Internal(format!(
                    "resume index {index} outside a block of {} statements",
                    stmts.len()
                ))
                .into());
            }
        }

        for (index, stmt) in stmts.iter().enumerate().skip(start.unwrap_or(0)) {
            // The hook of the statement we resume at already fired.
            let resumed_here = start == Some(index);
            if !resumed_here && self.rt.before_statement(stmt.pos()) {
                self.resume.push(Resume::Block { index });
                return Err(Signal::Pause);
            }

            let flow = stmt.exec(self);
            match self.suspend(flow, || Resume::Block { index })? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluate `exprs` left to right, picking up after the operands that
    /// were already evaluated when resuming.
    pub fn eval_operands(&mut self, exprs: &[&Expr]) -> Result<Vec<Value>, Signal> {
        if exprs.is_empty() {
            return Ok(Vec::new());
        }
        let mut values = self.resume.take_operands()?.unwrap_or_default();
        if values.len() >= exprs.len() {
            return Err(EvalError::Internal(format!(
                "resumed with {} of {} operands",
                values.len(),
                exprs.len()
            ))
            .into());
        }

        while let Some(expr) = exprs.get(values.len()) {
            match expr.eval(self) {
                Ok(value) => values.push(value),
                Err(Signal::Pause) => {
                    self.resume.push(Resume::Operands(values));
                    return Err(Signal::Pause);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(values)
    }

    /// Evaluate a single operand.
    pub fn eval_operand(&mut self, expr: &Expr) -> Result<Value, Signal> {
        let mut values = self.eval_operands(&[expr])?;
        values
            .pop()
            .ok_or_else(|| EvalError::Internal("operand vanished".to_string()).into())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════════════════

/// Evaluates an expression node to a value.
pub(crate) trait Evaluate {
    fn eval(&self, exec: &mut Exec<'_>) -> Result<Value, Signal>;
}

/// Executes a statement node.
pub(crate) trait Execute {
    fn exec(&self, exec: &mut Exec<'_>) -> Result<Flow, Signal>;
}

impl Evaluate for Expr {
    fn eval(&self, exec: &mut Exec<'_>) -> Result<Value, Signal> {
        ensure_sufficient_stack(|| self.dispatch(exec))
    }
}

impl Expr {
    fn dispatch(&self, exec: &mut Exec<'_>) -> Result<Value, Signal> {
        match self {
            Expr::NumberLit { value, .. } => Ok(literal::number(value)),
            Expr::StringLit { raw, .. } => Ok(Value::string(unquote(raw))),
            Expr::BoolLit { value, .. } => Ok(Value::Bool(*value)),
            Expr::NilLit { .. } => Ok(Value::Nil),
            Expr::ArrayLit { elements, .. } => literal::eval_array(elements, exec),
            Expr::DictLit { entries, pos } => literal::eval_dict(entries, *pos, exec),
            Expr::Identifier { name, pos } => exec
                .rt
                .current_env()
                .get(name)
                .map_err(|e| EvalError::from(e).at(*pos).into()),
            Expr::Index { target, index, pos } => index::eval_index(target, index, *pos, exec),
            Expr::Unary { op, operand, pos } => unary::eval_unary(*op, operand, *pos, exec),
            Expr::BinaryOp {
                op,
                left,
                right,
                pos,
            } => binary::eval_binary(*op, left, right, *pos, exec),
            Expr::FunctionCall { name, args, pos } => call::eval_call(name, args, *pos, exec),
        }
    }
}
