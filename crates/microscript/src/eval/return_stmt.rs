//! `return`

use super::{Evaluate, Exec, Flow, Signal};
use crate::ast::Expr;
use crate::value::Value;

/// A bare `return` yields `nil`. The enclosing call turns the flow back
/// into a value.
pub(crate) fn exec_return(value: Option<&Expr>, exec: &mut Exec<'_>) -> Result<Flow, Signal> {
    let value = match value {
        Some(expr) => expr.eval(exec)?,
        None => Value::Nil,
    };
    Ok(Flow::Return(value))
}
