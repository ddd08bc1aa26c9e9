// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Operator semantics: arithmetic, comparison, equality and the type
//! conversions they rely on.

use crate::ast::BinaryOperator;
use crate::builtins::error::ErrorKind;
use crate::runtime::{ObjectRef, Value};
use crate::{Engine, Throw};
use std::cmp::Ordering;

/// Conversion preference for [`to_primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Default,
    Number,
    String,
}

/// ToPrimitive: objects are converted by calling `valueOf`/`toString`.
pub(crate) fn to_primitive(engine: &Engine, value: &Value, hint: Hint) -> Result<Value, Throw> {
    let Value::Object(object) = value else {
        return Ok(value.clone());
    };

    let order = match hint {
        Hint::String => ["toString", "valueOf"],
        Hint::Default | Hint::Number => ["valueOf", "toString"],
    };
    for name in order {
        let method = object.get(name);
        if method.is_callable() {
            let result = engine.call(&method, value.clone(), &[])?;
            if !matches!(result, Value::Object(_)) {
                return Ok(result);
            }
        }
    }
    Err(engine.throw(
        ErrorKind::TypeError,
        "Cannot convert object to primitive value",
    ))
}

/// ToNumber, invoking script conversions on objects.
pub(crate) fn to_number(engine: &Engine, value: &Value) -> Result<f64, Throw> {
    Ok(to_primitive(engine, value, Hint::Number)?.to_number())
}

/// ToInt32
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc() % 4294967296.0;
    let n = if n < 0.0 { n + 4294967296.0 } else { n };
    n as u32 as i32
}

/// ToUint32
pub(crate) fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}

/// Exponentiation with the script rules for NaN and unit bases.
pub(crate) fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// The `+` operator.
pub(crate) fn add(engine: &Engine, left: &Value, right: &Value) -> Result<Value, Throw> {
    let left = to_primitive(engine, left, Hint::Default)?;
    let right = to_primitive(engine, right, Hint::Default)?;
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let mut out = left.to_display_string();
        out.push_str(&right.to_display_string());
        return Ok(Value::from(out));
    }
    Ok(Value::Number(left.to_number() + right.to_number()))
}

/// Abstract relational comparison; `None` when either side is NaN.
fn compare(engine: &Engine, left: &Value, right: &Value) -> Result<Option<Ordering>, Throw> {
    let left = to_primitive(engine, left, Hint::Number)?;
    let right = to_primitive(engine, right, Hint::Number)?;
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Some(a.cmp(b)));
    }
    Ok(left.to_number().partial_cmp(&right.to_number()))
}

/// Loose equality, converting objects compared against primitives.
pub(crate) fn loose_equals(engine: &Engine, left: &Value, right: &Value) -> Result<bool, Throw> {
    match (left, right) {
        (Value::Object(_), Value::Object(_)) => Ok(left.strict_equals(right)),
        (Value::Object(_), other) if !other.is_nullish() => {
            let primitive = to_primitive(engine, left, Hint::Default)?;
            Ok(primitive.loose_equals(right))
        }
        (other, Value::Object(_)) if !other.is_nullish() => {
            let primitive = to_primitive(engine, right, Hint::Default)?;
            Ok(left.loose_equals(&primitive))
        }
        _ => Ok(left.loose_equals(right)),
    }
}

/// Walks the prototype chain of `object` looking for `prototype`.
pub(crate) fn inherits(object: &ObjectRef, prototype: &ObjectRef) -> bool {
    let mut current = object.prototype();
    while let Some(candidate) = current {
        if candidate.ptr_eq(prototype) {
            return true;
        }
        current = candidate.prototype();
    }
    false
}

fn instance_of(engine: &Engine, left: &Value, right: &Value) -> Result<bool, Throw> {
    let Value::Object(constructor) = right else {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "Right-hand side of 'instanceof' is not callable",
        ));
    };
    if !constructor.is_callable() {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "Right-hand side of 'instanceof' is not callable",
        ));
    }
    let Value::Object(object) = left else {
        return Ok(false);
    };
    match constructor.get("prototype") {
        Value::Object(prototype) => Ok(inherits(object, &prototype)),
        _ => Err(engine.throw(
            ErrorKind::TypeError,
            "Function has non-object prototype in instanceof check",
        )),
    }
}

fn has_property(engine: &Engine, left: &Value, right: &Value) -> Result<bool, Throw> {
    let key = engine.to_string(left)?;
    match right {
        Value::Object(object) => Ok(object.has_property(&key)),
        other => Err(engine.throw(
            ErrorKind::TypeError,
            format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key,
                other.to_display_string()
            ),
        )),
    }
}

/// Applies a binary operator to evaluated operands.
pub(crate) fn binary(
    engine: &Engine,
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<Value, Throw> {
    use BinaryOperator::*;

    let numeric = |f: fn(f64, f64) -> f64| -> Result<Value, Throw> {
        Ok(Value::Number(f(to_number(engine, left)?, to_number(engine, right)?)))
    };
    let int32 = |f: fn(i32, i32) -> i32| -> Result<Value, Throw> {
        let a = to_int32(to_number(engine, left)?);
        let b = to_int32(to_number(engine, right)?);
        Ok(Value::Number(f(a, b) as f64))
    };

    match operator {
        Add => add(engine, left, right),
        Subtract => numeric(|a, b| a - b),
        Multiply => numeric(|a, b| a * b),
        Divide => numeric(|a, b| a / b),
        Modulo => numeric(|a, b| a % b),
        Exponent => numeric(power),
        Equal => Ok(Value::Boolean(loose_equals(engine, left, right)?)),
        NotEqual => Ok(Value::Boolean(!loose_equals(engine, left, right)?)),
        StrictEqual => Ok(Value::Boolean(left.strict_equals(right))),
        StrictNotEqual => Ok(Value::Boolean(!left.strict_equals(right))),
        LessThan => Ok(Value::Boolean(
            compare(engine, left, right)? == Some(Ordering::Less),
        )),
        LessThanEqual => Ok(Value::Boolean(matches!(
            compare(engine, left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        ))),
        GreaterThan => Ok(Value::Boolean(
            compare(engine, left, right)? == Some(Ordering::Greater),
        )),
        GreaterThanEqual => Ok(Value::Boolean(matches!(
            compare(engine, left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        LeftShift => int32(|a, b| a.wrapping_shl(b as u32 & 31)),
        RightShift => int32(|a, b| a >> (b as u32 & 31)),
        UnsignedRightShift => {
            let a = to_uint32(to_number(engine, left)?);
            let b = to_uint32(to_number(engine, right)?);
            Ok(Value::Number((a >> (b & 31)) as f64))
        }
        BitwiseAnd => int32(|a, b| a & b),
        BitwiseOr => int32(|a, b| a | b),
        BitwiseXor => int32(|a, b| a ^ b),
        In => Ok(Value::Boolean(has_property(engine, left, right)?)),
        InstanceOf => Ok(Value::Boolean(instance_of(engine, left, right)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Value {
        Engine::new()
            .eval(source)
            .unwrap_or_else(|e| panic!("{}: {}", source, e))
    }

    #[test]
    fn test_to_int32() {
        assert_eq!(to_int32(4294967296.0 + 5.0), 5);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(2147483648.0), -2147483648);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_uint32(-1.0), u32::MAX);
    }

    #[test]
    fn test_power() {
        assert_eq!(power(2.0, 10.0), 1024.0);
        assert!(power(1.0, f64::NAN).is_nan());
        assert!(power(1.0, f64::INFINITY).is_nan());
    }

    #[test]
    fn test_addition_and_concatenation() {
        assert_eq!(eval("1 + 2"), Value::Number(3.0));
        assert_eq!(eval("'1' + 2"), Value::from("12"));
        assert_eq!(eval("[1, 2] + ''"), Value::from("1,2"));
        assert_eq!(eval("({ valueOf() { return 41; } }) + 1"), Value::Number(42.0));
        assert_eq!(
            eval("const o = { toString() { return 'custom'; } }; `<${o}>`"),
            Value::from("<custom>")
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("7 % 3 + 2 ** 3 - 10 / 4"), Value::Number(6.5));
        assert_eq!(eval("'6' * '7'"), Value::Number(42.0));
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
        assert!(eval("'a' - 1").as_number().unwrap().is_nan());
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("'apple' < 'banana'"), Value::Boolean(true));
        assert_eq!(eval("'10' < 9"), Value::Boolean(false));
        assert_eq!(eval("NaN <= NaN"), Value::Boolean(false));
        assert_eq!(eval("3 >= 3"), Value::Boolean(true));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("null == undefined"), Value::Boolean(true));
        assert_eq!(eval("null == 0"), Value::Boolean(false));
        assert_eq!(eval("'1' == 1 && 1 !== '1'"), Value::Boolean(true));
        assert_eq!(eval("[1] == 1"), Value::Boolean(true));
        assert_eq!(eval("NaN === NaN"), Value::Boolean(false));
        assert_eq!(eval("const o = {}; o === o && o != {}"), Value::Boolean(true));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(eval("5 & 3 | 8 ^ 1"), Value::Number(9.0));
        assert_eq!(eval("1 << 4"), Value::Number(16.0));
        assert_eq!(eval("-16 >> 2"), Value::Number(-4.0));
        assert_eq!(eval("-1 >>> 28"), Value::Number(15.0));
        assert_eq!(eval("~5"), Value::Number(-6.0));
    }

    #[test]
    fn test_in_and_instanceof() {
        assert_eq!(eval("'a' in { a: 1 }"), Value::Boolean(true));
        assert_eq!(eval("'push' in []"), Value::Boolean(true));
        assert_eq!(eval("[] instanceof Array && !({} instanceof Array)"), Value::Boolean(true));
        assert_eq!(eval("1 instanceof Number"), Value::Boolean(false));
        let err = Engine::new().eval("'a' in 'abc'").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "TypeError");
        let err = Engine::new().eval("({}) instanceof 5").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "TypeError");
    }
}
