// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Number and Boolean.

use super::{arg, constructor, integer_arg, method};
use crate::builtins::error::ErrorKind;
use crate::builtins::global;
use crate::runtime::{number_to_string, Value};
use crate::{Engine, Throw};

/// 2^53 - 1
pub const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

pub(crate) fn register(engine: &Engine) {
    let intrinsics = &engine.context().intrinsics;

    let prototype = intrinsics.number_prototype.clone();
    method(engine, &prototype, "toString", 1, number_to_string_method);
    method(engine, &prototype, "toFixed", 1, to_fixed);
    method(engine, &prototype, "valueOf", 0, number_value_of);

    let number = constructor(engine, "Number", 1, &prototype, number_constructor);
    method(engine, &number, "isInteger", 1, is_integer);
    method(engine, &number, "isSafeInteger", 1, is_safe_integer);
    method(engine, &number, "isFinite", 1, is_finite);
    method(engine, &number, "isNaN", 1, is_nan);
    method(engine, &number, "parseFloat", 1, global::parse_float);
    method(engine, &number, "parseInt", 2, global::parse_int);
    number.define_hidden("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER);
    number.define_hidden("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER);
    number.define_hidden("EPSILON", f64::EPSILON);
    number.define_hidden("MAX_VALUE", f64::MAX);
    number.define_hidden("MIN_VALUE", 5e-324);
    number.define_hidden("POSITIVE_INFINITY", f64::INFINITY);
    number.define_hidden("NEGATIVE_INFINITY", f64::NEG_INFINITY);
    number.define_hidden("NaN", f64::NAN);
    engine.set_global("Number", Value::Object(number));

    let prototype = intrinsics.boolean_prototype.clone();
    method(engine, &prototype, "toString", 0, boolean_to_string);
    method(engine, &prototype, "valueOf", 0, boolean_value_of);
    let boolean = constructor(engine, "Boolean", 1, &prototype, boolean_constructor);
    engine.set_global("Boolean", Value::Object(boolean));
}

fn this_number(engine: &Engine, this: &Value, name: &str) -> Result<f64, Throw> {
    match this {
        Value::Number(n) => Ok(*n),
        _ => Err(engine.throw(
            ErrorKind::TypeError,
            format!("Number.prototype.{} requires that 'this' be a Number", name),
        )),
    }
}

/// `Number(value)`
pub fn number_constructor(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Number(match args.first() {
        None => 0.0,
        Some(value) => value.to_number(),
    }))
}

/// Formats `n` in the given radix, with a fractional part when present.
fn to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }

    let negative = n < 0.0;
    let n = n.abs();
    let mut integer = n.trunc();
    let mut fraction = n - integer;

    let mut digits = Vec::new();
    if integer == 0.0 {
        digits.push('0');
    }
    while integer >= 1.0 {
        let digit = (integer % radix as f64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        integer = (integer / radix as f64).trunc();
    }
    digits.reverse();

    let mut out: String = digits.into_iter().collect();
    if fraction > 0.0 {
        out.push('.');
        for _ in 0..52 {
            fraction *= radix as f64;
            let digit = fraction.trunc() as u32;
            out.push(std::char::from_digit(digit, radix).unwrap_or('0'));
            fraction -= digit as f64;
            if fraction <= 0.0 {
                break;
            }
        }
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Number.prototype.toString(radix)
pub fn number_to_string_method(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let n = this_number(engine, this, "toString")?;
    let radix = integer_arg(args, 0, 10.0);
    if !(2.0..=36.0).contains(&radix) {
        return Err(engine.throw(
            ErrorKind::RangeError,
            "toString() radix must be between 2 and 36",
        ));
    }
    Ok(Value::from(to_radix_string(n, radix as u32)))
}

/// Number.prototype.toFixed(digits)
pub fn to_fixed(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let n = this_number(engine, this, "toFixed")?;
    let digits = integer_arg(args, 0, 0.0);
    if !(0.0..=100.0).contains(&digits) {
        return Err(engine.throw(
            ErrorKind::RangeError,
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(Value::from(number_to_string(n)));
    }
    Ok(Value::from(format!("{:.*}", digits as usize, n)))
}

/// Number.prototype.valueOf()
pub fn number_value_of(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Number(this_number(engine, this, "valueOf")?))
}

/// Number.isInteger(value)
pub fn is_integer(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(matches!(
        arg(args, 0),
        Value::Number(n) if n.is_finite() && n.trunc() == n
    )))
}

/// Number.isSafeInteger(value)
pub fn is_safe_integer(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(matches!(
        arg(args, 0),
        Value::Number(n) if n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER
    )))
}

/// Number.isFinite(value); unlike the global, no conversion.
pub fn is_finite(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
}

/// Number.isNaN(value)
pub fn is_nan(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
}

/// `Boolean(value)`
pub fn boolean_constructor(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(arg(args, 0).to_boolean()))
}

fn this_boolean(engine: &Engine, this: &Value) -> Result<bool, Throw> {
    match this {
        Value::Boolean(b) => Ok(*b),
        _ => Err(engine.throw(
            ErrorKind::TypeError,
            "Boolean.prototype.valueOf requires that 'this' be a Boolean",
        )),
    }
}

/// Boolean.prototype.toString()
pub fn boolean_to_string(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(if this_boolean(engine, this)? { "true" } else { "false" }))
}

/// Boolean.prototype.valueOf()
pub fn boolean_value_of(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(this_boolean(engine, this)?))
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
    fn test_number_conversion() {
        assert_eq!(eval("Number('42')"), Value::Number(42.0));
        assert_eq!(eval("Number('')"), Value::Number(0.0));
        assert_eq!(eval("Number()"), Value::Number(0.0));
        assert!(eval("Number('abc')").as_number().unwrap().is_nan());
        assert_eq!(eval("Number(true) + Number(null)"), Value::Number(1.0));
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(eval("(3.14159).toFixed(2)"), Value::from("3.14"));
        assert_eq!(eval("(10).toFixed()"), Value::from("10"));
        assert_eq!(eval("(0.5).toFixed(3)"), Value::from("0.500"));
    }

    #[test]
    fn test_to_string_radix() {
        assert_eq!(eval("(255).toString(16)"), Value::from("ff"));
        assert_eq!(eval("(5).toString(2)"), Value::from("101"));
        assert_eq!(eval("(-8).toString(8)"), Value::from("-10"));
        assert_eq!(eval("(0.5).toString(2)"), Value::from("0.1"));
        assert_eq!(eval("(1.5).toString()"), Value::from("1.5"));
    }

    #[test]
    fn test_predicates() {
        assert_eq!(
            eval("[Number.isInteger(5), Number.isInteger(5.5), Number.isInteger('5')].join()"),
            Value::from("true,false,false")
        );
        assert_eq!(eval("Number.isNaN('x') || Number.isFinite('1')"), Value::Boolean(false));
        assert_eq!(eval("Number.isSafeInteger(Number.MAX_SAFE_INTEGER + 1)"), Value::Boolean(false));
        assert_eq!(eval("Number.parseInt('12px')"), Value::Number(12.0));
    }

    #[test]
    fn test_boolean() {
        assert_eq!(eval("Boolean('') || Boolean(0)"), Value::Boolean(false));
        assert_eq!(eval("Boolean('x') && Boolean({})"), Value::Boolean(true));
        assert_eq!(eval("true.toString() + false"), Value::from("truefalse"));
    }
}
