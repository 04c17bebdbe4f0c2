//! Function call evaluation

use std::rc::Rc;

use super::resume::{CallState, Resume};
use super::{Exec, Flow, Signal};
use crate::ast::Expr;
use crate::error::{type_name, EvalError};
use crate::position::Position;
use crate::value::{BuiltinFn, UserFunction, Value};

/// `name(args...)`: resolve the callee, evaluate the arguments left to
/// right, then call.
pub(crate) fn eval_call(
    name: &str,
    args: &[Expr],
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Value, Signal> {
    let callee = match exec.resume.take_call()? {
        Some(CallState::Body { function }) => return run_body(function, exec),
        Some(CallState::Args { callee }) => callee,
        None => exec
            .rt
            .current_env()
            .get(name)
            .map_err(|e| EvalError::from(e).at(pos))?,
    };

    let exprs: Vec<&Expr> = args.iter().collect();
    let argv = exec.eval_operands(&exprs);
    let argv = exec.suspend(argv, || {
        Resume::Call(CallState::Args {
            callee: callee.clone(),
        })
    })?;

    match callee {
        Value::Function(function) => {
            exec.rt
                .enter_function(
                    function.name(),
                    function.params(),
                    argv,
                    &function.closure_env,
                    Some(pos),
                )
                .map_err(|e| EvalError::from(e).at(pos))?;
            run_body(function, exec)
        }
        Value::Builtin(builtin) => call_builtin(&builtin, &argv, pos).map_err(Signal::from),
        other => Err(EvalError::NotCallable {
            name: name.to_string(),
            type_name: type_name(&other).to_string(),
            pos: Some(pos),
        }
        .into()),
    }
}

/// Run a function body in the frame pushed for it and pop the frame when
/// the body completes. A pause keeps the frame; so does an error, for
/// post-mortem inspection.
fn run_body(function: Rc<UserFunction>, exec: &mut Exec<'_>) -> Result<Value, Signal> {
    let flow = exec.exec_block(function.body());
    let flow = exec.suspend(flow, || Resume::Call(CallState::Body {
        function: Rc::clone(&function),
    }))?;

    exec.rt.leave_function()?;
    Ok(match flow {
        Flow::Return(value) => value,
        Flow::Normal => Value::Nil,
    })
}

fn call_builtin(builtin: &BuiltinFn, args: &[Value], pos: Position) -> Result<Value, EvalError> {
    if !builtin.arity.accepts(args.len()) {
        return Err(EvalError::ArityMismatch {
            name: builtin.name.clone(),
            expected: builtin.arity.to_string(),
            got: args.len(),
            pos: Some(pos),
        });
    }
    builtin.call(args).map_err(|message| EvalError::BuiltinError {
        name: builtin.name.clone(),
        message,
        pos: Some(pos),
    })
}
