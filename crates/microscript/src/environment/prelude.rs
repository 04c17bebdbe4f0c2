//! Standard prelude with built-in functions

use std::cmp::Ordering;

use super::Env;
use crate::ast::BinaryOp;
use crate::error::type_name;
use crate::eval::binary::binary_op;
use crate::value::{compare, release, Arity, ArrayRef, BuiltinFn, DictRef, HashableValue, Value};

/// Upper bound on the length of a list built by `range`.
const MAX_RANGE_LEN: i64 = 10_000_000;

impl Env {
    /// Create a global scope holding the default builtins.
    pub fn with_prelude() -> Self {
        let env = Self::new();
        env.load_builtins(&default_builtins());
        env
    }

    /// Bind every builtin of `table` under its own name.
    pub fn load_builtins(&self, table: &[BuiltinFn]) {
        for builtin in table {
            self.define_builtin(builtin.clone());
        }
    }

    /// Bind one builtin under its own name.
    pub fn define_builtin(&self, builtin: BuiltinFn) {
        self.define(builtin.name.clone(), Value::Builtin(builtin));
    }
}

/// The default builtin table, in definition order.
pub fn default_builtins() -> Vec<BuiltinFn> {
    use Arity::*;

    vec![
        // Conversions and introspection
        BuiltinFn::new("len", Exact(1), builtin_len),
        BuiltinFn::new("type", Exact(1), builtin_type),
        BuiltinFn::new("str", Exact(1), |args| Ok(Value::string(args[0].to_string()))),
        BuiltinFn::new("int", Exact(1), builtin_int),
        BuiltinFn::new("float", Exact(1), builtin_float),
        BuiltinFn::new("bool", Exact(1), |args| Ok(Value::Bool(args[0].is_truthy()))),
        // Maths
        BuiltinFn::new("abs", Exact(1), builtin_abs),
        BuiltinFn::new("min", AtLeast(1), |args| extremum(args, Ordering::Less)),
        BuiltinFn::new("max", AtLeast(1), |args| extremum(args, Ordering::Greater)),
        BuiltinFn::new("sum", Exact(1), builtin_sum),
        BuiltinFn::new("pow", Exact(2), |args| {
            binary_op(BinaryOp::Pow, &args[0], &args[1]).map_err(|e| e.to_string())
        }),
        BuiltinFn::new("sqrt", Exact(1), builtin_sqrt),
        BuiltinFn::new("floor", Exact(1), |args| round_with(&args[0], f64::floor)),
        BuiltinFn::new("ceil", Exact(1), |args| round_with(&args[0], f64::ceil)),
        BuiltinFn::new("round", Between(1, 2), builtin_round),
        // Sequences
        BuiltinFn::new("range", Between(1, 3), builtin_range),
        BuiltinFn::new("enumerate", Exact(1), builtin_enumerate),
        BuiltinFn::new("sorted", Between(1, 2), builtin_sorted),
        BuiltinFn::new("reversed", Exact(1), |args| {
            let mut items = args[0].iter_items()?;
            items.reverse();
            Ok(Value::array(items))
        }),
        // Strings
        BuiltinFn::new("join", Exact(2), builtin_join),
        BuiltinFn::new("split", Between(1, 2), builtin_split),
        BuiltinFn::new("upper", Exact(1), |args| {
            Ok(Value::string(args[0].to_string().to_uppercase()))
        }),
        BuiltinFn::new("lower", Exact(1), |args| {
            Ok(Value::string(args[0].to_string().to_lowercase()))
        }),
        BuiltinFn::new("strip", Between(1, 2), builtin_strip),
        BuiltinFn::new("startswith", Exact(2), |args| {
            let prefix = expect_str(&args[1], "prefix")?;
            Ok(Value::Bool(args[0].to_string().starts_with(prefix)))
        }),
        BuiltinFn::new("endswith", Exact(2), |args| {
            let suffix = expect_str(&args[1], "suffix")?;
            Ok(Value::Bool(args[0].to_string().ends_with(suffix)))
        }),
        // Arrays
        BuiltinFn::new("push", Exact(2), |args| {
            expect_array(&args[0])?.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }),
        BuiltinFn::new("pop", Exact(1), |args| {
            Ok(expect_array(&args[0])?.borrow_mut().pop().unwrap_or(Value::Nil))
        }),
        BuiltinFn::new("extend", Exact(2), |args| {
            let items = args[1].iter_items()?;
            expect_array(&args[0])?.borrow_mut().extend(items);
            Ok(args[0].clone())
        }),
        BuiltinFn::new("insert", Exact(3), builtin_insert),
        BuiltinFn::new("remove", Exact(2), builtin_remove),
        // Dicts
        BuiltinFn::new("keys", Exact(1), |args| {
            let dict = expect_dict(&args[0])?;
            let keys = dict.borrow().keys().map(HashableValue::to_value).collect();
            Ok(Value::array(keys))
        }),
        BuiltinFn::new("values", Exact(1), |args| {
            let dict = expect_dict(&args[0])?;
            let values = dict.borrow().values().cloned().collect();
            Ok(Value::array(values))
        }),
        BuiltinFn::new("items", Exact(1), |args| {
            let dict = expect_dict(&args[0])?;
            let items = dict
                .borrow()
                .iter()
                .map(|(k, v)| Value::array(vec![k.to_value(), v.clone()]))
                .collect();
            Ok(Value::array(items))
        }),
        BuiltinFn::new("get", Between(2, 3), |args| {
            let dict = expect_dict(&args[0])?;
            let key = HashableValue::from_value(&args[1])?;
            let found = dict.borrow().get(&key).cloned();
            Ok(found.unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::Nil)))
        }),
        BuiltinFn::new("has", Exact(2), builtin_has),
        BuiltinFn::new("update", Exact(2), |args| {
            let target = expect_dict(&args[0])?;
            let source = expect_dict(&args[1])?;
            let entries: Vec<_> = source
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            target.borrow_mut().extend(entries);
            Ok(args[0].clone())
        }),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
// Argument Helpers
// ═══════════════════════════════════════════════════════════════════════

fn expect_array(value: &Value) -> Result<ArrayRef, String> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(format!("expected an array, got {}", type_name(other))),
    }
}

fn expect_dict(value: &Value) -> Result<DictRef, String> {
    match value {
        Value::Dict(entries) => Ok(entries.clone()),
        other => Err(format!("expected a dict, got {}", type_name(other))),
    }
}

fn expect_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("{} must be a string, got {}", what, type_name(value)))
}

fn expect_int(value: &Value, what: &str) -> Result<i64, String> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(x) if x.fract() == 0.0 => Ok(*x as i64),
        other => Err(format!("{} must be an integer, got {}", what, type_name(other))),
    }
}

fn expect_number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected a number, got {}", type_name(value)))
}

/// Convert a finite float to an int, rejecting nan, infinities and values
/// out of range.
fn float_to_int(x: f64) -> Result<i64, String> {
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(format!("cannot convert {} to int", crate::value::format_float(x)))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_len(args: &[Value]) -> Result<Value, String> {
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Dict(entries) => entries.borrow().len(),
        other => return Err(format!("object of type '{}' has no len()", type_name(other))),
    };
    Ok(Value::Int(len as i64))
}

fn builtin_type(args: &[Value]) -> Result<Value, String> {
    let name = match &args[0] {
        Value::Nil => "nil",
        Value::Bool(_) => "bool",
        Value::Int(_) | Value::Float(_) => "number",
        Value::Str(_) => "string",
        Value::Array(_) => "list",
        Value::Dict(_) => "dict",
        Value::Function(_) | Value::Builtin(_) => "function",
    };
    Ok(Value::string(name))
}

fn builtin_int(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => float_to_int(x.trunc()).map(Value::Int),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| format!("invalid literal for int(): {:?}", s.as_ref())),
        other => Err(format!("cannot convert {} to int", type_name(other))),
    }
}

fn builtin_float(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| format!("could not convert string to float: {:?}", s.as_ref())),
        other => Err(format!("cannot convert {} to float", type_name(other))),
    }
}

fn builtin_abs(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(format!("bad operand type for abs(): '{}'", type_name(other))),
    }
}

/// `min`/`max`: a single array argument is searched element-wise, otherwise
/// the arguments themselves are.
fn extremum(args: &[Value], wanted: Ordering) -> Result<Value, String> {
    let items = match args {
        [Value::Array(items)] => items.borrow().clone(),
        _ => args.to_vec(),
    };
    let mut best = items
        .first()
        .cloned()
        .ok_or_else(|| "arg is an empty sequence".to_string())?;
    for item in items.iter().skip(1) {
        if compare(item, &best)? == wanted {
            best = item.clone();
        }
    }
    Ok(best)
}

fn builtin_sum(args: &[Value]) -> Result<Value, String> {
    let items = args[0].iter_items()?;
    items.iter().try_fold(Value::Int(0), |total, item| {
        if item.as_f64().is_none() {
            return Err(format!("unsupported operand type for sum: '{}'", type_name(item)));
        }
        binary_op(BinaryOp::Add, &total, item).map_err(|e| e.to_string())
    })
}

fn builtin_sqrt(args: &[Value]) -> Result<Value, String> {
    let x = expect_number(&args[0])?;
    if x < 0.0 {
        return Err("math domain error".to_string());
    }
    Ok(Value::Float(x.sqrt()))
}

fn round_with(value: &Value, op: fn(f64) -> f64) -> Result<Value, String> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => float_to_int(op(expect_number(other)?)).map(Value::Int),
    }
}

/// `round(x)` rounds half to even and returns an int; `round(x, n)` keeps
/// `n` decimal places and returns a float.
fn builtin_round(args: &[Value]) -> Result<Value, String> {
    match args {
        [value] => round_with(value, f64::round_ties_even),
        [Value::Int(n), _] => Ok(Value::Int(*n)),
        [value, digits] => {
            let x = expect_number(value)?;
            let digits = expect_int(digits, "ndigits")?.clamp(-308, 308) as i32;
            let scale = 10f64.powi(digits);
            Ok(Value::Float((x * scale).round_ties_even() / scale))
        }
        _ => Err("expected 1 or 2 arguments".to_string()),
    }
}

fn builtin_range(args: &[Value]) -> Result<Value, String> {
    let (start, stop, step) = match args {
        [stop] => (0, expect_int(stop, "stop")?, 1),
        [start, stop] => (expect_int(start, "start")?, expect_int(stop, "stop")?, 1),
        [start, stop, step] => (
            expect_int(start, "start")?,
            expect_int(stop, "stop")?,
            expect_int(step, "step")?,
        ),
        _ => return Err("expected 1 to 3 arguments".to_string()),
    };
    if step == 0 {
        return Err("step must not be zero".to_string());
    }

    let span = i128::from(stop) - i128::from(start);
    let step_wide = i128::from(step);
    let len = if (span > 0) == (step > 0) && span != 0 {
        (span.abs() + step_wide.abs() - 1) / step_wide.abs()
    } else {
        0
    };
    if len > i128::from(MAX_RANGE_LEN) {
        return Err(format!("range of {} elements is too large", len));
    }

    let items = (0..len as i64)
        .map(|i| Value::Int(start + i * step))
        .collect();
    Ok(Value::array(items))
}

fn builtin_enumerate(args: &[Value]) -> Result<Value, String> {
    let pairs = args[0]
        .iter_items()?
        .into_iter()
        .enumerate()
        .map(|(i, item)| Value::array(vec![Value::Int(i as i64), item]))
        .collect();
    Ok(Value::array(pairs))
}

fn builtin_sorted(args: &[Value]) -> Result<Value, String> {
    let mut items = args[0].iter_items()?;
    let mut failure = None;
    items.sort_by(|a, b| {
        compare(a, b).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            Ordering::Equal
        })
    });
    if let Some(message) = failure {
        return Err(message);
    }
    if args.get(1).is_some_and(Value::is_truthy) {
        items.reverse();
    }
    Ok(Value::array(items))
}

fn builtin_join(args: &[Value]) -> Result<Value, String> {
    let sep = args[0].to_string();
    let parts: Vec<String> = args[1]
        .iter_items()?
        .iter()
        .map(ToString::to_string)
        .collect();
    Ok(Value::string(parts.join(&sep)))
}

fn builtin_split(args: &[Value]) -> Result<Value, String> {
    let text = args[0].to_string();
    let parts: Vec<Value> = match args.get(1) {
        None | Some(Value::Nil) => text.split_whitespace().map(Value::string).collect(),
        Some(sep) => {
            let sep = expect_str(sep, "separator")?;
            if sep.is_empty() {
                return Err("empty separator".to_string());
            }
            text.split(sep).map(Value::string).collect()
        }
    };
    Ok(Value::array(parts))
}

fn builtin_strip(args: &[Value]) -> Result<Value, String> {
    let text = args[0].to_string();
    let stripped = match args.get(1) {
        None | Some(Value::Nil) => text.trim().to_string(),
        Some(chars) => {
            let chars: Vec<char> = expect_str(chars, "chars")?.chars().collect();
            text.trim_matches(chars.as_slice()).to_string()
        }
    };
    Ok(Value::string(stripped))
}

fn builtin_insert(args: &[Value]) -> Result<Value, String> {
    let items = expect_array(&args[0])?;
    let index = expect_int(&args[1], "index")?;
    let mut items = items.borrow_mut();
    let len = items.len() as i64;
    let at = if index < 0 { (len + index).max(0) } else { index.min(len) };
    items.insert(at as usize, args[2].clone());
    drop(items);
    Ok(args[0].clone())
}

fn builtin_remove(args: &[Value]) -> Result<Value, String> {
    let items = expect_array(&args[0])?;
    let position = items.borrow().iter().position(|item| *item == args[1]);
    match position {
        Some(at) => {
            let removed = items.borrow_mut().remove(at);
            release([removed]);
            Ok(args[0].clone())
        }
        None => Err(format!("{:?} not in list", args[1])),
    }
}

fn builtin_has(args: &[Value]) -> Result<Value, String> {
    let found = match &args[0] {
        Value::Dict(entries) => {
            let key = HashableValue::from_value(&args[1])?;
            entries.borrow().contains_key(&key)
        }
        Value::Array(items) => items.borrow().iter().any(|item| *item == args[1]),
        Value::Str(s) => s.contains(expect_str(&args[1], "substring")?),
        other => return Err(format!("'{}' is not a container", type_name(other))),
    };
    Ok(Value::Bool(found))
}
