//! Constructors, conversions, equality and ordering for Value

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{HashableValue, Value};
use crate::error::type_name;
use crate::stack::ensure_sufficient_stack;

// ═══════════════════════════════════════════════════════════════════════
// Constructors
// ═══════════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Create a fresh array.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Create a fresh dict from prepared keys.
    pub fn dict(entries: IndexMap<HashableValue, Value>) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    /// Create a fresh dict from key/value pairs; later keys overwrite
    /// earlier ones.
    ///
    /// # Errors
    ///
    /// Fails if a key is not hashable.
    pub fn dict_from(pairs: Vec<(Value, Value)>) -> Result<Self, String> {
        let mut entries = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            entries.insert(HashableValue::from_value(&key)?, value);
        }
        Ok(Value::dict(entries))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// User-facing type name.
    pub fn type_name(&self) -> &'static str {
        type_name(self)
    }

    /// Truthiness: `nil`, `false`, zero, and empty strings and containers
    /// are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    /// True for user functions and builtins.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Integer view, accepting integral floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(x) if x.fract() == 0.0 => Some(*x as i64),
            _ => None,
        }
    }

    /// Borrowed view of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements produced by `for` over this value: array elements (a
    /// snapshot), string characters, or dict keys.
    pub fn iter_items(&self) -> Result<Vec<Value>, String> {
        match self {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            Value::Dict(entries) => Ok(entries.borrow().keys().map(|k| k.to_value()).collect()),
            other => Err(format!("'{}' object is not iterable", type_name(other))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Equality and Ordering
// ═══════════════════════════════════════════════════════════════════════

/// Pairs of containers currently being walked, identified by address.
type ActivePairs = HashSet<(*const (), *const ())>;

/// Structural equality. Ints and floats compare numerically; containers
/// compare element-wise; functions compare by identity. Never fails.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut ActivePairs::new())
    }
}

/// A pair of containers met again while still being compared is taken to
/// be equal, so self-containing values compare without looping.
fn structural_eq(left: &Value, right: &Value, active: &mut ActivePairs) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if !active.insert(pair) {
                return true;
            }
            let equal = ensure_sufficient_stack(|| {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| structural_eq(x, y, active))
            });
            active.remove(&pair);
            equal
        }
        (Value::Dict(a), Value::Dict(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if !active.insert(pair) {
                return true;
            }
            let equal = ensure_sufficient_stack(|| {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.get(key)
                            .is_some_and(|other| structural_eq(value, other, active))
                    })
            });
            active.remove(&pair);
            equal
        }
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(&a.func, &b.func),
        _ => false,
    }
}

/// Ordering for `< <= > >=`, `sorted`, `min` and `max`.
///
/// Numbers compare with numbers, strings with strings and arrays
/// lexicographically. Any other pairing is an error.
pub(crate) fn compare(left: &Value, right: &Value) -> Result<Ordering, String> {
    structural_cmp(left, right, &mut ActivePairs::new())
}

fn structural_cmp(
    left: &Value,
    right: &Value,
    active: &mut ActivePairs,
) -> Result<Ordering, String> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return Ok(Ordering::Equal);
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if !active.insert(pair) {
                return Ok(Ordering::Equal);
            }
            let (a, b) = (a.borrow().clone(), b.borrow().clone());
            let ordering = ensure_sufficient_stack(|| {
                for (x, y) in a.iter().zip(b.iter()) {
                    match structural_cmp(x, y, active) {
                        Ok(Ordering::Equal) => {}
                        Err(_) if x == y => {}
                        decided => return decided,
                    }
                }
                Ok(a.len().cmp(&b.len()))
            });
            active.remove(&pair);
            ordering
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| "cannot order nan".to_string()),
            _ => Err(format!(
                "cannot compare '{}' with '{}'",
                type_name(left),
                type_name(right)
            )),
        },
    }
}
