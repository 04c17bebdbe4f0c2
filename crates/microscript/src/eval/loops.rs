//! `while` and `for` loops

use super::resume::{ForState, Resume};
use super::{Evaluate, Exec, Flow, Signal};
use crate::ast::{Expr, Stmt};
use crate::error::EvalError;
use crate::position::Position;

/// Re-test `cond` before every pass. More passes than the configured
/// ceiling abort the loop.
pub(crate) fn exec_while(
    cond: &Expr,
    body: &[Stmt],
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Flow, Signal> {
    let limit = exec.ctx.max_loop_iterations;
    let (mut iterations, mut in_body) = exec.resume.take_while()?.unwrap_or((0, false));

    loop {
        if !in_body {
            let test = cond.eval(exec);
            let test = exec.suspend(test, || Resume::While {
                iterations,
                in_body: false,
            })?;
            if !test.is_truthy() {
                return Ok(Flow::Normal);
            }
            if iterations >= limit {
                return Err(EvalError::LoopLimit {
                    limit,
                    pos: Some(pos),
                }
                .into());
            }
            iterations += 1;
        }
        in_body = false;

        let flow = exec.exec_block(body);
        let flow = exec.suspend(flow, || Resume::While {
            iterations,
            in_body: true,
        })?;
        if let Flow::Return(value) = flow {
            return Ok(Flow::Return(value));
        }
    }
}

/// Evaluate the iterable once and bind each item to `var` in the current
/// scope. The binding outlives the loop.
pub(crate) fn exec_for(
    var: &str,
    iterable: &Expr,
    body: &[Stmt],
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Flow, Signal> {
    let (items, start, already_bound) = match exec.resume.take_for()? {
        Some(ForState::Body { items, next }) => (items, next, true),
        Some(ForState::Iterable) | None => {
            let value = iterable.eval(exec);
            let value = exec.suspend(value, || Resume::For(ForState::Iterable))?;
            let items = value
                .iter_items()
                .map_err(|msg| EvalError::type_error(msg, Some(pos)))?;
            (items, 0, false)
        }
    };

    for (next, item) in items.iter().enumerate().skip(start) {
        if !(already_bound && next == start) {
            exec.rt.current_env().set(var, item.clone());
        }
        let flow = exec.exec_block(body);
        let flow = exec.suspend(flow, || {
            Resume::For(ForState::Body {
                items: items.clone(),
                next,
            })
        })?;
        if let Flow::Return(value) = flow {
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Normal)
}
