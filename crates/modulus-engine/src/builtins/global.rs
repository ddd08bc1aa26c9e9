// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global functions and value properties.

use super::{arg, method};
use crate::runtime::Value;
use crate::{Engine, Throw};

pub(crate) fn register(engine: &Engine) {
    engine.set_global("NaN", Value::Number(f64::NAN));
    engine.set_global("Infinity", Value::Number(f64::INFINITY));
    engine.set_global("undefined", Value::Undefined);

    let holder = engine.new_object();
    method(engine, &holder, "parseInt", 2, parse_int);
    method(engine, &holder, "parseFloat", 1, parse_float);
    method(engine, &holder, "isNaN", 1, is_nan);
    method(engine, &holder, "isFinite", 1, is_finite);
    for name in ["parseInt", "parseFloat", "isNaN", "isFinite"] {
        engine.set_global(name, holder.get(name));
    }
}

/// parseInt(string, radix)
pub fn parse_int(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let text = engine.to_string(&arg(args, 0))?;
    let mut s = text.trim_start();

    let mut sign = 1.0;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1.0;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }

    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        value => {
            let r = value.to_number();
            if r.is_nan() { 0 } else { r.trunc() as i64 }
        }
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    if radix == 0 || radix == 16 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }

    let mut result: Option<f64> = None;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        result = Some(result.unwrap_or(0.0) * radix as f64 + digit as f64);
    }
    Ok(Value::Number(result.map_or(f64::NAN, |n| sign * n)))
}

/// parseFloat(string)
pub fn parse_float(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let text = engine.to_string(&arg(args, 0))?;
    Ok(Value::Number(parse_float_prefix(text.trim_start())))
}

/// Parses the longest decimal literal prefix of `s`.
fn parse_float_prefix(s: &str) -> f64 {
    let (sign, body) = match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = body.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    let literal = body[..end].trim_end_matches('.');
    literal.parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

/// isNaN(value)
pub fn is_nan(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(arg(args, 0).to_number().is_nan()))
}

/// isFinite(value)
pub fn is_finite(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(arg(args, 0).to_number().is_finite()))
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
    fn test_parse_int() {
        assert_eq!(eval("parseInt('42')"), Value::Number(42.0));
        assert_eq!(eval("parseInt('  -17abc')"), Value::Number(-17.0));
        assert_eq!(eval("parseInt('0x1F')"), Value::Number(31.0));
        assert_eq!(eval("parseInt('101', 2)"), Value::Number(5.0));
        assert_eq!(eval("parseInt('3.9')"), Value::Number(3.0));
        assert!(eval("parseInt('abc')").as_number().unwrap().is_nan());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(eval("parseFloat('3.14 is pi')"), Value::Number(3.14));
        assert_eq!(eval("parseFloat('.5')"), Value::Number(0.5));
        assert_eq!(eval("parseFloat('1e3x')"), Value::Number(1000.0));
        assert_eq!(eval("parseFloat('2.')"), Value::Number(2.0));
        assert_eq!(eval("parseFloat('-Infinity')"), Value::Number(f64::NEG_INFINITY));
        assert!(eval("parseFloat('e5')").as_number().unwrap().is_nan());
    }

    #[test]
    fn test_is_nan_and_is_finite() {
        assert_eq!(eval("isNaN('abc') && !isNaN('12')"), Value::Boolean(true));
        assert_eq!(eval("isFinite('12') && !isFinite(Infinity)"), Value::Boolean(true));
        assert_eq!(eval("typeof undefined + typeof NaN"), Value::from("undefinednumber"));
    }
}
