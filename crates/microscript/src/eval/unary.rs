//! Unary operation evaluation

use super::{Exec, Signal};
use crate::ast::{Expr, UnaryOp};
use crate::error::{type_name, EvalError};
use crate::position::Position;
use crate::value::Value;

pub(crate) fn eval_unary(
    op: UnaryOp,
    operand: &Expr,
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Value, Signal> {
    let value = exec.eval_operand(operand)?;
    unary_op(op, &value).map_err(|e| e.at(pos).into())
}

fn unary_op(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Plus, Value::Int(_) | Value::Float(_)) => Ok(value.clone()),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::arithmetic("integer overflow in unary '-'", None)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (op, other) => Err(EvalError::type_error(
            format!(
                "bad operand type for unary {}: '{}'",
                op.symbol(),
                type_name(other)
            ),
            None,
        )),
    }
}
