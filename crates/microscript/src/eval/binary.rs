//! Binary operation evaluation

use std::cmp::Ordering;

use super::{Exec, Signal};
use crate::ast::{BinaryOp, Expr};
use crate::error::{type_name, EvalError};
use crate::position::Position;
use crate::value::{compare, Value};

/// Largest string or array a repetition may produce.
const MAX_REPEAT_LEN: usize = 10_000_000;

pub(crate) fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Value, Signal> {
    // No short-circuiting: both sides are always evaluated, left first.
    let values = exec.eval_operands(&[left, right])?;
    let [left, right] = values.as_slice() else {
        return Err(EvalError::Internal("binary operation lost an operand".to_string()).into());
    };
    binary_op(op, left, right).map_err(|e| e.at(pos).into())
}

/// Apply `op` to two values. Errors carry no position.
pub(crate) fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub => match numeric(op, left, right)? {
            Operands::Ints(a, b) => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(op)),
            Operands::Floats(a, b) => Ok(Value::Float(a - b)),
        },
        BinaryOp::Mul => eval_mul(left, right),
        BinaryOp::Div => eval_div(left, right),
        BinaryOp::FloorDiv => eval_floor_div(left, right),
        BinaryOp::Mod => eval_mod(left, right),
        BinaryOp::Pow => eval_pow(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => eval_ordering(op, left, right),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Operand Helpers
// ═══════════════════════════════════════════════════════════════════════

enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Two ints stay ints; any other pair of numbers is promoted to floats.
fn numeric(op: BinaryOp, left: &Value, right: &Value) -> Result<Operands, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Ok(Operands::Ints(*a, *b));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Operands::Floats(a, b)),
        _ => Err(unsupported(op, left, right)),
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(
        format!(
            "unsupported operand types for {}: '{}' and '{}'",
            op,
            type_name(left),
            type_name(right)
        ),
        None,
    )
}

fn overflow(op: BinaryOp) -> EvalError {
    EvalError::arithmetic(format!("integer overflow in '{}'", op), None)
}

fn zero_division(op: BinaryOp) -> EvalError {
    let what = if op == BinaryOp::Mod { "modulo" } else { "division" };
    EvalError::arithmetic(format!("{what} by zero"), None)
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

/// `+` concatenates as soon as either side is a string.
fn eval_add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::string(format!("{left}{right}"))),
        (Value::Array(a), Value::Array(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::array(items))
        }
        _ => match numeric(BinaryOp::Add, left, right)? {
            Operands::Ints(a, b) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| overflow(BinaryOp::Add)),
            Operands::Floats(a, b) => Ok(Value::Float(a + b)),
        },
    }
}

fn eval_mul(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            let times = repeat_count(s.len(), *n)?;
            Ok(Value::string(s.repeat(times)))
        }
        (Value::Array(items), Value::Int(n)) | (Value::Int(n), Value::Array(items)) => {
            let items = items.borrow();
            let times = repeat_count(items.len(), *n)?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::array(repeated))
        }
        _ => match numeric(BinaryOp::Mul, left, right)? {
            Operands::Ints(a, b) => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or_else(|| overflow(BinaryOp::Mul)),
            Operands::Floats(a, b) => Ok(Value::Float(a * b)),
        },
    }
}

/// Negative counts repeat zero times.
fn repeat_count(len: usize, times: i64) -> Result<usize, EvalError> {
    let times = usize::try_from(times).unwrap_or(0);
    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(EvalError::arithmetic("repetition result is too large", None)),
    }
}

/// True division: always a float.
fn eval_div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (a, b) = match numeric(BinaryOp::Div, left, right)? {
        Operands::Ints(a, b) => (a as f64, b as f64),
        Operands::Floats(a, b) => (a, b),
    };
    if b == 0.0 {
        return Err(zero_division(BinaryOp::Div));
    }
    Ok(Value::Float(a / b))
}

/// Division rounded toward negative infinity.
fn eval_floor_div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::FloorDiv;
    match numeric(op, left, right)? {
        Operands::Ints(_, 0) => Err(zero_division(op)),
        Operands::Ints(a, b) => {
            let q = a.checked_div(b).ok_or_else(|| overflow(op))?;
            let q = if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q };
            Ok(Value::Int(q))
        }
        Operands::Floats(_, b) if b == 0.0 => Err(zero_division(op)),
        Operands::Floats(a, b) => Ok(Value::Float((a / b).floor())),
    }
}

/// Remainder with the sign of the divisor.
fn eval_mod(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Mod;
    match numeric(op, left, right)? {
        Operands::Ints(_, 0) => Err(zero_division(op)),
        Operands::Ints(_, -1) => Ok(Value::Int(0)),
        Operands::Ints(a, b) => {
            let r = a % b;
            Ok(Value::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
        }
        Operands::Floats(_, b) if b == 0.0 => Err(zero_division(op)),
        Operands::Floats(a, b) => {
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
        }
    }
}

/// Integer powers stay integers; a negative integer exponent gives a float.
fn eval_pow(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Pow;
    match numeric(op, left, right)? {
        Operands::Ints(a, b) if b >= 0 => {
            let exp = u32::try_from(b).map_err(|_| overflow(op))?;
            a.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow(op))
        }
        Operands::Ints(a, b) => float_pow(a as f64, b as f64),
        Operands::Floats(a, b) => float_pow(a, b),
    }
}

fn float_pow(base: f64, exp: f64) -> Result<Value, EvalError> {
    if base == 0.0 && exp < 0.0 {
        return Err(EvalError::arithmetic(
            "zero cannot be raised to a negative power",
            None,
        ));
    }
    if base < 0.0 && exp.fract() != 0.0 {
        return Err(EvalError::arithmetic(
            "negative number cannot be raised to a fractional power",
            None,
        ));
    }
    Ok(Value::Float(base.powf(exp)))
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison
// ═══════════════════════════════════════════════════════════════════════

fn eval_ordering(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match compare(left, right) {
        Ok(ordering) => ordering,
        // nan is unordered: every comparison with it is false
        Err(_) if left.as_f64().is_some() && right.as_f64().is_some() => {
            return Ok(Value::Bool(false));
        }
        Err(_) => {
            return Err(EvalError::type_error(
                format!(
                    "'{}' not supported between '{}' and '{}'",
                    op,
                    type_name(left),
                    type_name(right)
                ),
                None,
            ));
        }
    };

    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        other => {
            return Err(EvalError::Internal(format!(
                "'{other}' is not an ordering operator"
            )));
        }
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: BinaryOp, left: Value, right: Value) -> Value {
        binary_op(op, &left, &right).unwrap()
    }

    fn fails(op: BinaryOp, left: Value, right: Value) -> EvalError {
        binary_op(op, &left, &right).unwrap_err()
    }

    fn int(n: i64) -> Value {
        Value::Int(n)
    }

    fn float(x: f64) -> Value {
        Value::Float(x)
    }

    fn text(s: &str) -> Value {
        Value::string(s)
    }

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(apply(BinaryOp::Add, int(2), int(3)), Value::Int(5));
        assert_eq!(apply(BinaryOp::Sub, int(2), int(3)), Value::Int(-1));
        assert_eq!(apply(BinaryOp::Mul, int(4), int(3)), Value::Int(12));
        assert_eq!(apply(BinaryOp::Pow, int(2), int(10)), Value::Int(1024));
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(apply(BinaryOp::Div, int(7), int(2)), Value::Float(3.5));
        assert_eq!(apply(BinaryOp::Div, int(6), int(3)), Value::Float(2.0));
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(apply(BinaryOp::FloorDiv, int(7), int(2)), Value::Int(3));
        assert_eq!(apply(BinaryOp::FloorDiv, int(-7), int(2)), Value::Int(-4));
        assert_eq!(apply(BinaryOp::FloorDiv, int(7), int(-2)), Value::Int(-4));
        assert_eq!(apply(BinaryOp::Mod, int(7), int(2)), Value::Int(1));
        assert_eq!(apply(BinaryOp::Mod, int(-7), int(2)), Value::Int(1));
        assert_eq!(apply(BinaryOp::Mod, int(7), int(-2)), Value::Int(-1));
        assert_eq!(apply(BinaryOp::Mod, float(7.5), int(2)), Value::Float(1.5));
        assert_eq!(apply(BinaryOp::FloorDiv, float(7.5), int(2)), Value::Float(3.0));
    }

    #[test]
    fn test_negative_exponent_gives_float() {
        assert_eq!(apply(BinaryOp::Pow, int(2), int(-1)), Value::Float(0.5));
        assert_eq!(apply(BinaryOp::Pow, float(4.0), float(0.5)), Value::Float(2.0));
    }

    #[test]
    fn test_mixed_numbers_promote() {
        assert_eq!(apply(BinaryOp::Add, int(1), float(0.5)), Value::Float(1.5));
        assert_eq!(apply(BinaryOp::Mul, float(2.0), int(3)), Value::Float(6.0));
    }

    #[test]
    fn test_string_coercing_add() {
        assert_eq!(apply(BinaryOp::Add, text("a"), int(1)), Value::string("a1"));
        assert_eq!(apply(BinaryOp::Add, int(1), text("a")), Value::string("1a"));
        assert_eq!(apply(BinaryOp::Add, text("x"), float(2.0)), Value::string("x2.0"));
        assert_eq!(apply(BinaryOp::Add, text("n"), Value::Nil), Value::string("nnil"));
    }

    #[test]
    fn test_repetition() {
        assert_eq!(apply(BinaryOp::Mul, text("ab"), int(3)), Value::string("ababab"));
        assert_eq!(apply(BinaryOp::Mul, int(2), text("ab")), Value::string("abab"));
        assert_eq!(apply(BinaryOp::Mul, text("ab"), int(-1)), Value::string(""));
        assert_eq!(
            apply(BinaryOp::Mul, Value::array(vec![Value::Int(0)]), int(3)),
            Value::array(vec![Value::Int(0); 3])
        );
    }

    #[test]
    fn test_array_concatenation_copies() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(2)]);
        let joined = binary_op(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(joined, Value::array(vec![Value::Int(1), Value::Int(2)]));
        if let Value::Array(items) = &a {
            assert_eq!(items.borrow().len(), 1);
        }
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            fails(BinaryOp::Div, int(1), int(0)),
            EvalError::arithmetic("division by zero", None)
        );
        assert_eq!(
            fails(BinaryOp::Mod, int(1), int(0)),
            EvalError::arithmetic("modulo by zero", None)
        );
        assert!(matches!(
            fails(BinaryOp::FloorDiv, float(1.0), float(0.0)),
            EvalError::ArithmeticError { .. }
        ));
        assert!(matches!(
            fails(BinaryOp::Pow, int(0), int(-1)),
            EvalError::ArithmeticError { .. }
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(
            fails(BinaryOp::Add, int(i64::MAX), int(1)),
            EvalError::arithmetic("integer overflow in '+'", None)
        );
        assert!(matches!(
            fails(BinaryOp::Pow, int(10), int(40)),
            EvalError::ArithmeticError { .. }
        ));
        assert!(matches!(
            fails(BinaryOp::FloorDiv, int(i64::MIN), int(-1)),
            EvalError::ArithmeticError { .. }
        ));
        assert_eq!(apply(BinaryOp::Mod, int(i64::MIN), int(-1)), Value::Int(0));
    }

    #[test]
    fn test_type_errors() {
        assert_eq!(
            fails(BinaryOp::Sub, text("a"), int(1)),
            EvalError::type_error("unsupported operand types for -: 'string' and 'int'", None)
        );
        assert_eq!(
            fails(BinaryOp::Lt, text("a"), int(1)),
            EvalError::type_error("'<' not supported between 'string' and 'int'", None)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply(BinaryOp::Lt, int(1), int(2)), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Ge, float(2.5), int(2)), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Le, text("abc"), text("abd")), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Gt, float(f64::NAN), int(1)), Value::Bool(false));
        assert_eq!(apply(BinaryOp::Eq, int(1), float(1.0)), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Ne, int(1), text("1")), Value::Bool(true));
    }
}
