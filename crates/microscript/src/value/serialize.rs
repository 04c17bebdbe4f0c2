//! JSON-friendly serialization of values
//!
//! Scalars map to JSON scalars, arrays to sequences and dicts to maps with
//! stringified keys. Callables serialize as their display text. Nesting
//! deeper than [`MAX_DEPTH`] (including self-containing containers) is cut
//! off as `"..."`.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::Value;

/// Containers nested deeper than this serialize as `"..."`.
pub const MAX_DEPTH: usize = 32;

struct Bounded<'a> {
    value: &'a Value,
    depth: usize,
}

impl Serialize for Bounded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Function(_) | Value::Builtin(_) => {
                serializer.serialize_str(&self.value.to_string())
            }
            Value::Array(_) | Value::Dict(_) if self.depth >= MAX_DEPTH => {
                serializer.serialize_str("...")
            }
            Value::Array(items) => {
                let items = items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&Bounded {
                        value: item,
                        depth: self.depth + 1,
                    })?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in entries.iter() {
                    map.serialize_entry(
                        &key.to_string(),
                        &Bounded {
                            value: item,
                            depth: self.depth + 1,
                        },
                    )?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Bounded {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_and_containers() {
        let value = Value::dict_from(vec![
            (Value::string("a"), Value::array(vec![Value::Int(1), Value::Float(2.5)])),
            (Value::Int(3), Value::Nil),
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"a": [1, 2.5], "3": null})
        );
    }

    #[test]
    fn test_cycle_is_cut_off() {
        let arr = Value::array(vec![]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        let text = serde_json::to_string(&arr).unwrap();
        assert!(text.contains("\"...\""));
        if let Value::Array(items) = &arr {
            items.borrow_mut().clear();
        }
    }
}
