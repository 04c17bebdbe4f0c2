//! Value representation for runtime values

mod callable;
mod display;
mod hashable;
mod impls;
mod serialize;

pub use callable::{Arity, BuiltinFn, BuiltinFnPtr, UserFunction};
pub use display::format_float;
pub use hashable::HashableValue;
pub(crate) use impls::compare;

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

/// Shared, mutable array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable dict storage. Iteration follows insertion order.
pub type DictRef = Rc<RefCell<IndexMap<HashableValue, Value>>>;

/// Runtime value representation for the MicroScript interpreter.
///
/// Scalars and strings are immutable and compared by value. Arrays and dicts
/// are reference types: cloning a `Value` clones the handle, so a mutation
/// through one alias is visible through every other.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// The absent value
    Nil,

    /// `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit float
    Float(f64),

    /// Immutable string
    Str(Rc<str>),

    // ═══════════════════════════════════════════════════════════════════
    // Containers
    // ═══════════════════════════════════════════════════════════════════
    /// Ordered, mutable sequence
    Array(ArrayRef),

    /// Insertion-ordered, mutable mapping
    Dict(DictRef),

    // ═══════════════════════════════════════════════════════════════════
    // Callables
    // ═══════════════════════════════════════════════════════════════════
    /// Function defined with `def`, closing over its defining scope
    Function(Rc<UserFunction>),

    /// Native function from the builtin table
    Builtin(BuiltinFn),
}

/// Drop values without recursing through their containers.
///
/// Dropping a container the usual way recurses once per nesting level,
/// which a program can make arbitrarily deep. Containers held only by
/// `values` are emptied onto a work list instead; shared ones just lose
/// one reference.
pub(crate) fn release(values: impl IntoIterator<Item = Value>) {
    let mut pending: Vec<Value> = values.into_iter().collect();
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => {
                if let Ok(items) = Rc::try_unwrap(items) {
                    pending.extend(items.into_inner());
                }
            }
            Value::Dict(entries) => {
                if let Ok(entries) = Rc::try_unwrap(entries) {
                    pending.extend(entries.into_inner().into_values());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deep_nesting() {
        let mut value = Value::array(vec![]);
        for _ in 0..300_000 {
            value = Value::array(vec![value]);
        }
        release([value]);
    }

    #[test]
    fn test_release_keeps_shared_containers() {
        let shared = Value::array(vec![Value::Int(1)]);
        let outer = Value::dict_from(vec![(Value::string("k"), shared.clone())]).unwrap();
        release([outer]);
        assert_eq!(shared, Value::array(vec![Value::Int(1)]));
    }
}
