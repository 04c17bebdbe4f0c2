//! Index reads and writes: `target[index]`

use super::{Exec, Signal};
use crate::ast::Expr;
use crate::error::{type_name, EvalError};
use crate::position::Position;
use crate::value::{release, HashableValue, Value};

pub(crate) fn eval_index(
    target: &Expr,
    index: &Expr,
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Value, Signal> {
    let values = exec.eval_operands(&[target, index])?;
    let [target, index] = values.as_slice() else {
        return Err(EvalError::Internal("index expression lost an operand".to_string()).into());
    };
    read_index(target, index).map_err(|msg| EvalError::index_error(msg, Some(pos)).into())
}

/// Map a possibly negative index onto `0..len`.
fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn integer_index(container: &str, index: &Value) -> Result<i64, String> {
    match index {
        Value::Int(n) => Ok(*n),
        other => Err(format!(
            "{container} indices must be integers, not '{}'",
            type_name(other)
        )),
    }
}

/// `target[index]`. Errors are the bare failure text.
pub(crate) fn read_index(target: &Value, index: &Value) -> Result<Value, String> {
    match target {
        Value::Array(items) => {
            let items = items.borrow();
            let i = integer_index("array", index)?;
            normalize(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| "array index out of range".to_string())
        }
        Value::Str(s) => {
            let i = integer_index("string", index)?;
            let len = s.chars().count();
            normalize(i, len)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| "string index out of range".to_string())
        }
        Value::Dict(entries) => {
            let key = HashableValue::from_value(index)?;
            let entries = entries.borrow();
            entries
                .get(&key)
                .cloned()
                .ok_or_else(|| format!("key {:?} not found", key))
        }
        other => Err(format!("'{}' object is not subscriptable", type_name(other))),
    }
}

/// `target[index] = value`, mutating the container in place.
pub(crate) fn write_index(target: &Value, index: &Value, value: Value) -> Result<(), String> {
    match target {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            let i = integer_index("array", index)?;
            let slot = normalize(i, items.len())
                .ok_or_else(|| "array assignment index out of range".to_string())?;
            let previous = std::mem::replace(&mut items[slot], value);
            drop(items);
            release([previous]);
            Ok(())
        }
        Value::Dict(entries) => {
            let key = HashableValue::from_value(index)?;
            let previous = entries.borrow_mut().insert(key, value);
            release(previous);
            Ok(())
        }
        other => Err(format!(
            "'{}' object does not support item assignment",
            type_name(other)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array() -> Value {
        Value::array(vec![Value::Int(10), Value::Int(20), Value::Int(30)])
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0, 3), Some(0));
        assert_eq!(normalize(-1, 3), Some(2));
        assert_eq!(normalize(3, 3), None);
        assert_eq!(normalize(-4, 3), None);
        assert_eq!(normalize(0, 0), None);
    }

    #[test]
    fn test_read_array_and_string() {
        assert_eq!(read_index(&array(), &Value::Int(-1)).unwrap(), Value::Int(30));
        assert_eq!(
            read_index(&Value::string("héllo"), &Value::Int(1)).unwrap(),
            Value::string("é")
        );
        assert_eq!(
            read_index(&array(), &Value::Int(5)).unwrap_err(),
            "array index out of range"
        );
        assert_eq!(
            read_index(&array(), &Value::string("0")).unwrap_err(),
            "array indices must be integers, not 'string'"
        );
    }

    #[test]
    fn test_read_dict() {
        let dict = Value::dict_from(vec![(Value::string("a"), Value::Int(1))]).unwrap();
        assert_eq!(read_index(&dict, &Value::string("a")).unwrap(), Value::Int(1));
        assert_eq!(
            read_index(&dict, &Value::string("b")).unwrap_err(),
            "key \"b\" not found"
        );
    }

    #[test]
    fn test_read_unsubscriptable() {
        assert_eq!(
            read_index(&Value::Int(1), &Value::Int(0)).unwrap_err(),
            "'int' object is not subscriptable"
        );
    }

    #[test]
    fn test_write_mutates_through_aliases() {
        let a = array();
        let alias = a.clone();
        write_index(&a, &Value::Int(0), Value::Int(99)).unwrap();
        assert_eq!(read_index(&alias, &Value::Int(0)).unwrap(), Value::Int(99));
    }

    #[test]
    fn test_write_errors() {
        assert_eq!(
            write_index(&array(), &Value::Int(3), Value::Nil).unwrap_err(),
            "array assignment index out of range"
        );
        assert_eq!(
            write_index(&Value::string("abc"), &Value::Int(0), Value::Nil).unwrap_err(),
            "'string' object does not support item assignment"
        );
    }
}
