//! Display and Debug implementations for Value
//!
//! `Display` is what `print` and `str()` produce: strings appear raw at the
//! top level. `Debug` is the quoted representation used inside containers
//! and by the debugger.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::Value;
use crate::stack::ensure_sufficient_stack;

/// Format a float the way MicroScript prints it: integral values keep a
/// trailing `.0`, very large and very small magnitudes use exponent form.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else if x.abs() >= 1e16 || x.abs() < 1e-4 {
        format!("{:e}", x)
    } else {
        format!("{}", x)
    }
}

/// Writes values while tracking which containers are being printed, so a
/// container that contains itself prints as `[...]` / `{...}`.
struct Printer<'f, 'a> {
    f: &'f mut fmt::Formatter<'a>,
    active: HashSet<*const ()>,
}

impl Printer<'_, '_> {
    fn write(&mut self, value: &Value, quoted: bool) -> fmt::Result {
        match value {
            Value::Nil => self.f.write_str("nil"),
            Value::Bool(b) => write!(self.f, "{}", b),
            Value::Int(n) => write!(self.f, "{}", n),
            Value::Float(x) => self.f.write_str(&format_float(*x)),
            Value::Str(s) if quoted => write!(self.f, "{:?}", s.as_ref()),
            Value::Str(s) => self.f.write_str(s),
            Value::Function(func) => write!(self.f, "<function {}>", func.name()),
            Value::Builtin(builtin) => write!(self.f, "<builtin {}>", builtin.name),

            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if !self.active.insert(ptr) {
                    return self.f.write_str("[...]");
                }
                self.f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        self.f.write_str(", ")?;
                    }
                    ensure_sufficient_stack(|| self.write(item, true))?;
                }
                self.active.remove(&ptr);
                self.f.write_str("]")
            }

            Value::Dict(entries) => {
                let ptr = Rc::as_ptr(entries) as *const ();
                if !self.active.insert(ptr) {
                    return self.f.write_str("{...}");
                }
                self.f.write_str("{")?;
                for (i, (key, item)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        self.f.write_str(", ")?;
                    }
                    write!(self.f, "{:?}: ", key)?;
                    ensure_sufficient_stack(|| self.write(item, true))?;
                }
                self.active.remove(&ptr);
                self.f.write_str("}")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer {
            f,
            active: HashSet::new(),
        }
        .write(self, false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer {
            f,
            active: HashSet::new(),
        }
        .write(self, true)
    }
}
