//! Literal evaluation

use indexmap::IndexMap;

use super::{Exec, Signal};
use crate::ast::{Expr, Number};
use crate::error::EvalError;
use crate::position::Position;
use crate::value::{HashableValue, Value};

pub(crate) fn number(value: &Number) -> Value {
    match value {
        Number::Int(n) => Value::Int(*n),
        Number::Float(x) => Value::Float(*x),
    }
}

/// Strip the quotes the lexer left on a string literal and decode its
/// escapes. Unknown escapes are kept as written.
pub(crate) fn unquote(raw: &str) -> String {
    let inner = match (raw.chars().next(), raw.chars().last()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close && raw.len() >= 2 => {
            &raw[1..raw.len() - 1]
        }
        _ => raw,
    };

    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('\\') => text.push('\\'),
            Some('"') => text.push('"'),
            Some('\'') => text.push('\''),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }
    text
}

pub(crate) fn eval_array(elements: &[Expr], exec: &mut Exec<'_>) -> Result<Value, Signal> {
    let exprs: Vec<&Expr> = elements.iter().collect();
    let values = exec.eval_operands(&exprs)?;
    Ok(Value::array(values))
}

/// Keys and values are evaluated pairwise in source order; a repeated key
/// keeps its first position and its last value.
pub(crate) fn eval_dict(
    entries: &[(Expr, Expr)],
    pos: Position,
    exec: &mut Exec<'_>,
) -> Result<Value, Signal> {
    let exprs: Vec<&Expr> = entries.iter().flat_map(|(k, v)| [k, v]).collect();
    let values = exec.eval_operands(&exprs)?;

    let mut map = IndexMap::with_capacity(entries.len());
    let mut values = values.into_iter();
    while let (Some(key), Some(value)) = (values.next(), values.next()) {
        let key =
            HashableValue::from_value(&key).map_err(|msg| EvalError::type_error(msg, Some(pos)))?;
        map.insert(key, value);
    }
    Ok(Value::dict(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_strips_either_quote() {
        assert_eq!(unquote("\"hi\""), "hi");
        assert_eq!(unquote("'hi'"), "hi");
        assert_eq!(unquote("\"\""), "");
    }

    #[test]
    fn test_unquote_decodes_escapes() {
        assert_eq!(unquote(r#""a\nb\tc""#), "a\nb\tc");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(unquote(r#"'it\'s'"#), "it's");
        assert_eq!(unquote(r#""back\\slash""#), "back\\slash");
    }

    #[test]
    fn test_unquote_keeps_unknown_escapes() {
        assert_eq!(unquote(r#""\d+""#), "\\d+");
    }

    #[test]
    fn test_number() {
        assert_eq!(number(&Number::Int(3)), Value::Int(3));
        assert_eq!(number(&Number::Float(0.5)), Value::Float(0.5));
    }
}
