//! Assignment: `name = value` and `container[key] = value`

use super::index::write_index;
use super::{Evaluate, Exec, Flow, Signal};
use crate::ast::Expr;
use crate::error::EvalError;
use crate::position::Position;

/// The value is evaluated before the target. An index target then
/// evaluates its container and key and mutates the container in place.
pub(crate) fn exec_assign(
    target: &Expr,
    value: &Expr,
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Flow, Signal> {
    match target {
        Expr::Identifier { name, .. } => {
            let value = value.eval(exec)?;
            exec.rt.current_env().set(name, value);
        }
        Expr::Index {
            target: container,
            index,
            pos: index_pos,
        } => {
            let values = exec.eval_operands(&[value, container, index])?;
            let [value, container, key] = values.as_slice() else {
                return Err(EvalError::Internal("assignment lost an operand".to_string()).into());
            };
            write_index(container, key, value.clone())
                .map_err(|msg| EvalError::index_error(msg, Some(*index_pos)))?;
        }
        other => {
            value.eval(exec)?;
            return Err(EvalError::InvalidAssignTarget {
                kind: other.kind_name().to_string(),
                pos: Some(pos),
            }
            .into());
        }
    }
    Ok(Flow::Normal)
}
