//! Deterministic builtin functions.
//!
//! Builtins are pure functions on values, registered under dotted
//! names (`std.math.add`, `std.strings.upper`, …). They never perform
//! effects, so calling one requires no capability. Typing is strict:
//! math demands numbers, logic demands booleans, and wrong arity is an
//! error.

use crate::error::{ExecError, ExecResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// A builtin function.
pub type BuiltinFn = fn(&[Value]) -> ExecResult<Value>;

/// Registry of builtin functions, keyed by dotted name.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    functions: BTreeMap<String, BuiltinFn>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard library: `std.math`, `std.logic`,
    /// `std.collections`, `std.strings`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register("std.math.add", math_add);
        registry.register("std.math.sub", math_sub);
        registry.register("std.math.mul", math_mul);
        registry.register("std.math.div", math_div);
        registry.register("std.math.min", math_min);
        registry.register("std.math.max", math_max);
        registry.register("std.math.abs", math_abs);

        registry.register("std.logic.and_op", logic_and);
        registry.register("std.logic.or_op", logic_or);
        registry.register("std.logic.xor_op", logic_xor);
        registry.register("std.logic.not_op", logic_not);

        registry.register("std.collections.count", collections_count);
        registry.register("std.collections.first", collections_first);
        registry.register("std.collections.last", collections_last);
        registry.register("std.collections.contains", collections_contains);

        registry.register("std.strings.upper", strings_upper);
        registry.register("std.strings.lower", strings_lower);
        registry.register("std.strings.trim", strings_trim);
        registry.register("std.strings.length", strings_length);
        registry.register("std.strings.concat", strings_concat);

        registry
    }

    /// Register a builtin under a dotted name.
    pub fn register(&mut self, name: impl Into<String>, function: BuiltinFn) {
        self.functions.insert(name.into(), function);
    }

    /// Look up a builtin by name.
    pub fn lookup(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).copied()
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Argument helpers
// ─────────────────────────────────────────────────────────────────────

fn expect_arity(name: &str, args: &[Value], expected: usize) -> ExecResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ExecError::Builtin(format!(
            "{name} expects {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn expect_number(name: &str, value: &Value) -> ExecResult<f64> {
    value.as_f64().ok_or_else(|| {
        ExecError::Builtin(format!("{name} expects a number, got {}", value.type_name()))
    })
}

fn expect_bool(name: &str, value: &Value) -> ExecResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(ExecError::Builtin(format!(
            "{name} expects a boolean, got {}",
            other.type_name()
        ))),
    }
}

fn expect_str<'a>(name: &str, value: &'a Value) -> ExecResult<&'a str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(ExecError::Builtin(format!(
            "{name} expects a string, got {}",
            other.type_name()
        ))),
    }
}

fn expect_list<'a>(name: &str, value: &'a Value) -> ExecResult<&'a [Value]> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(ExecError::Builtin(format!(
            "{name} expects a list, got {}",
            other.type_name()
        ))),
    }
}

/// Int-preserving binary arithmetic: Int op Int stays Int, otherwise
/// promote to Float.
fn numeric_binary(
    name: &str,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> ExecResult<Value> {
    expect_arity(name, args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| ExecError::Builtin(format!("{name}: integer overflow"))),
        _ => {
            let a = expect_number(name, &args[0])?;
            let b = expect_number(name, &args[1])?;
            Ok(Value::Float(float_op(a, b)))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// std.math
// ─────────────────────────────────────────────────────────────────────

fn math_add(args: &[Value]) -> ExecResult<Value> {
    numeric_binary("std.math.add", args, i64::checked_add, |a, b| a + b)
}

fn math_sub(args: &[Value]) -> ExecResult<Value> {
    numeric_binary("std.math.sub", args, i64::checked_sub, |a, b| a - b)
}

fn math_mul(args: &[Value]) -> ExecResult<Value> {
    numeric_binary("std.math.mul", args, i64::checked_mul, |a, b| a * b)
}

/// Division is always float division.
fn math_div(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.math.div", args, 2)?;
    let a = expect_number("std.math.div", &args[0])?;
    let b = expect_number("std.math.div", &args[1])?;
    if b == 0.0 {
        return Err(ExecError::Builtin("std.math.div: division by zero".into()));
    }
    Ok(Value::Float(a / b))
}

fn math_min(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.math.min", args, 2)?;
    let a = expect_number("std.math.min", &args[0])?;
    let b = expect_number("std.math.min", &args[1])?;
    Ok(if a <= b { args[0].clone() } else { args[1].clone() })
}

fn math_max(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.math.max", args, 2)?;
    let a = expect_number("std.math.max", &args[0])?;
    let b = expect_number("std.math.max", &args[1])?;
    Ok(if a >= b { args[0].clone() } else { args[1].clone() })
}

fn math_abs(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.math.abs", args, 1)?;
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| ExecError::Builtin("std.math.abs: integer overflow".into())),
        Value::Float(n) => Ok(Value::Float(n.abs())),
        other => Err(ExecError::Builtin(format!(
            "std.math.abs expects a number, got {}",
            other.type_name()
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────
// std.logic — strictly boolean
// ─────────────────────────────────────────────────────────────────────

fn logic_and(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.logic.and_op", args, 2)?;
    let a = expect_bool("std.logic.and_op", &args[0])?;
    let b = expect_bool("std.logic.and_op", &args[1])?;
    Ok(Value::Bool(a && b))
}

fn logic_or(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.logic.or_op", args, 2)?;
    let a = expect_bool("std.logic.or_op", &args[0])?;
    let b = expect_bool("std.logic.or_op", &args[1])?;
    Ok(Value::Bool(a || b))
}

fn logic_xor(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.logic.xor_op", args, 2)?;
    let a = expect_bool("std.logic.xor_op", &args[0])?;
    let b = expect_bool("std.logic.xor_op", &args[1])?;
    Ok(Value::Bool(a ^ b))
}

fn logic_not(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.logic.not_op", args, 1)?;
    let a = expect_bool("std.logic.not_op", &args[0])?;
    Ok(Value::Bool(!a))
}

// ─────────────────────────────────────────────────────────────────────
// std.collections
// ─────────────────────────────────────────────────────────────────────

fn collections_count(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.collections.count", args, 1)?;
    let items = expect_list("std.collections.count", &args[0])?;
    Ok(Value::Int(items.len() as i64))
}

fn collections_first(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.collections.first", args, 1)?;
    let items = expect_list("std.collections.first", &args[0])?;
    Ok(items.first().cloned().unwrap_or(Value::Null))
}

fn collections_last(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.collections.last", args, 1)?;
    let items = expect_list("std.collections.last", &args[0])?;
    Ok(items.last().cloned().unwrap_or(Value::Null))
}

fn collections_contains(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.collections.contains", args, 2)?;
    let items = expect_list("std.collections.contains", &args[0])?;
    Ok(Value::Bool(items.contains(&args[1])))
}

// ─────────────────────────────────────────────────────────────────────
// std.strings
// ─────────────────────────────────────────────────────────────────────

fn strings_upper(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.strings.upper", args, 1)?;
    let s = expect_str("std.strings.upper", &args[0])?;
    Ok(Value::Str(s.to_uppercase()))
}

fn strings_lower(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.strings.lower", args, 1)?;
    let s = expect_str("std.strings.lower", &args[0])?;
    Ok(Value::Str(s.to_lowercase()))
}

fn strings_trim(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.strings.trim", args, 1)?;
    let s = expect_str("std.strings.trim", &args[0])?;
    Ok(Value::Str(s.trim().to_string()))
}

fn strings_length(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.strings.length", args, 1)?;
    let s = expect_str("std.strings.length", &args[0])?;
    Ok(Value::Int(s.chars().count() as i64))
}

fn strings_concat(args: &[Value]) -> ExecResult<Value> {
    expect_arity("std.strings.concat", args, 2)?;
    let a = expect_str("std.strings.concat", &args[0])?;
    let b = expect_str("std.strings.concat", &args[1])?;
    Ok(Value::Str(format!("{a}{b}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_add_preserves_int() {
        let f = BuiltinRegistry::standard().lookup("std.math.add").unwrap();
        assert_eq!(f(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(
            f(&[Value::Int(2), Value::Float(0.5)]).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_math_div_is_float_division() {
        let f = BuiltinRegistry::standard().lookup("std.math.div").unwrap();
        assert_eq!(
            f(&[Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Float(3.5)
        );
        assert!(f(&[Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn test_logic_rejects_non_booleans() {
        let f = BuiltinRegistry::standard()
            .lookup("std.logic.and_op")
            .unwrap();
        let err = f(&[Value::Int(1), Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, ExecError::Builtin(_)));
    }

    #[test]
    fn test_wrong_arity() {
        let f = BuiltinRegistry::standard()
            .lookup("std.strings.upper")
            .unwrap();
        assert!(f(&[]).is_err());
    }

    #[test]
    fn test_collections() {
        let registry = BuiltinRegistry::standard();
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let count = registry.lookup("std.collections.count").unwrap();
        assert_eq!(count(&[list.clone()]).unwrap(), Value::Int(2));
        let contains = registry.lookup("std.collections.contains").unwrap();
        assert_eq!(
            contains(&[list, Value::Int(2)]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_strings() {
        let registry = BuiltinRegistry::standard();
        let upper = registry.lookup("std.strings.upper").unwrap();
        assert_eq!(
            upper(&[Value::Str("abc".into())]).unwrap(),
            Value::Str("ABC".into())
        );
        let length = registry.lookup("std.strings.length").unwrap();
        assert_eq!(length(&[Value::Str("héllo".into())]).unwrap(), Value::Int(5));
    }
}
