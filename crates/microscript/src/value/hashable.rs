//! Hashable wrapper for Value to enable use as dict keys

use std::fmt;
use std::rc::Rc;

use super::{format_float, Value};
use crate::error::type_name;

/// A dict key.
///
/// Only scalars and strings can be keys. Floats with an integral value are
/// stored as integers, so `d[1]` and `d[1.0]` address the same entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum HashableValue {
    /// `nil`
    Nil,
    /// Boolean key
    Bool(bool),
    /// Integer key (also integral floats)
    Int(i64),
    /// Non-integral float key, by bit pattern
    Float(u64),
    /// String key
    Str(Rc<str>),
}

impl HashableValue {
    /// Convert a value into a key.
    ///
    /// # Errors
    ///
    /// Returns a message naming the type when the value cannot be a key.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        Ok(match value {
            Value::Nil => HashableValue::Nil,
            Value::Bool(b) => HashableValue::Bool(*b),
            Value::Int(n) => HashableValue::Int(*n),
            Value::Float(x) => Self::from_float(*x),
            Value::Str(s) => HashableValue::Str(s.clone()),
            other => return Err(format!("unhashable type: '{}'", type_name(other))),
        })
    }

    /// Check if a value can be used as a key.
    pub fn is_hashable(value: &Value) -> bool {
        matches!(
            value,
            Value::Nil | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    fn from_float(x: f64) -> Self {
        let integral = x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64;
        if integral {
            HashableValue::Int(x as i64)
        } else {
            HashableValue::Float(x.to_bits())
        }
    }

    /// Convert the key back into a value.
    pub fn to_value(&self) -> Value {
        match self {
            HashableValue::Nil => Value::Nil,
            HashableValue::Bool(b) => Value::Bool(*b),
            HashableValue::Int(n) => Value::Int(*n),
            HashableValue::Float(bits) => Value::Float(f64::from_bits(*bits)),
            HashableValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Debug for HashableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashableValue::Str(s) => write!(f, "{:?}", s.as_ref()),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for HashableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashableValue::Nil => f.write_str("nil"),
            HashableValue::Bool(b) => write!(f, "{}", b),
            HashableValue::Int(n) => write!(f, "{}", n),
            HashableValue::Float(bits) => f.write_str(&format_float(f64::from_bits(*bits))),
            HashableValue::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_matches_int() {
        let a = HashableValue::from_value(&Value::Int(1)).unwrap();
        let b = HashableValue::from_value(&Value::Float(1.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fractional_float_round_trips() {
        let key = HashableValue::from_value(&Value::Float(2.5)).unwrap();
        assert_eq!(key.to_value(), Value::Float(2.5));
    }

    #[test]
    fn test_containers_are_unhashable() {
        let err = HashableValue::from_value(&Value::array(vec![])).unwrap_err();
        assert_eq!(err, "unhashable type: 'array'");
        assert!(!HashableValue::is_hashable(&Value::array(vec![])));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(HashableValue::Str("k".into()).to_string(), "k");
        assert_eq!(format!("{:?}", HashableValue::Str("k".into())), "\"k\"");
        assert_eq!(HashableValue::Nil.to_string(), "nil");
    }
}
