// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The Math object.

use super::{arg, method};
use crate::runtime::Value;
use crate::{Engine, Throw};

pub(crate) fn register(engine: &Engine) {
    let math = engine.new_object();

    for (name, value) in [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ] {
        math.define_hidden(name, value);
    }

    method(engine, &math, "abs", 1, abs);
    method(engine, &math, "floor", 1, floor);
    method(engine, &math, "ceil", 1, ceil);
    method(engine, &math, "round", 1, round);
    method(engine, &math, "trunc", 1, trunc);
    method(engine, &math, "sign", 1, sign);
    method(engine, &math, "sqrt", 1, sqrt);
    method(engine, &math, "cbrt", 1, cbrt);
    method(engine, &math, "exp", 1, exp);
    method(engine, &math, "log", 1, log);
    method(engine, &math, "log2", 1, log2);
    method(engine, &math, "log10", 1, log10);
    method(engine, &math, "sin", 1, sin);
    method(engine, &math, "cos", 1, cos);
    method(engine, &math, "tan", 1, tan);
    method(engine, &math, "atan2", 2, atan2);
    method(engine, &math, "pow", 2, pow);
    method(engine, &math, "hypot", 2, hypot);
    method(engine, &math, "min", 2, min);
    method(engine, &math, "max", 2, max);
    method(engine, &math, "random", 0, random);

    engine.set_global("Math", Value::Object(math));
}

fn number_arg(args: &[Value], i: usize) -> f64 {
    arg(args, i).to_number()
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> Result<Value, Throw> {
    Ok(Value::Number(f(number_arg(args, 0))))
}

/// Math.abs(x)
pub fn abs(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::abs)
}

/// Math.floor(x)
pub fn floor(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::floor)
}

/// Math.ceil(x)
pub fn ceil(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::ceil)
}

/// Math.round(x); halves round towards +Infinity.
pub fn round(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, |x| {
        if !x.is_finite() || x.fract() == 0.0 {
            x
        } else {
            (x + 0.5).floor()
        }
    })
}

/// Math.trunc(x)
pub fn trunc(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::trunc)
}

/// Math.sign(x)
pub fn sign(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, |x| {
        if x.is_nan() || x == 0.0 {
            x
        } else {
            x.signum()
        }
    })
}

/// Math.sqrt(x)
pub fn sqrt(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::sqrt)
}

/// Math.cbrt(x)
pub fn cbrt(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::cbrt)
}

/// Math.exp(x)
pub fn exp(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::exp)
}

/// Math.log(x)
pub fn log(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::ln)
}

/// Math.log2(x)
pub fn log2(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::log2)
}

/// Math.log10(x)
pub fn log10(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::log10)
}

/// Math.sin(x)
pub fn sin(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::sin)
}

/// Math.cos(x)
pub fn cos(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::cos)
}

/// Math.tan(x)
pub fn tan(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    unary(args, f64::tan)
}

/// Math.atan2(y, x)
pub fn atan2(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Number(number_arg(args, 0).atan2(number_arg(args, 1))))
}

/// Math.pow(base, exponent)
pub fn pow(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Number(crate::vm::power(
        number_arg(args, 0),
        number_arg(args, 1),
    )))
}

/// Math.hypot(...values)
pub fn hypot(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(Value::Number(sum.sqrt()))
}

/// Math.min(...values)
pub fn min(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let mut result = f64::INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

/// Math.max(...values)
pub fn max(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let mut result = f64::NEG_INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n > result || (n == 0.0 && result == 0.0 && n.is_sign_positive()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

/// Math.random()
pub fn random(engine: &Engine, _this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Number(engine.context().next_random()))
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
    fn test_rounding() {
        assert_eq!(eval("Math.floor(4.7) + Math.ceil(4.2)"), Value::Number(9.0));
        assert_eq!(eval("Math.round(2.5)"), Value::Number(3.0));
        assert_eq!(eval("Math.round(-2.5)"), Value::Number(-2.0));
        assert_eq!(eval("Math.trunc(-4.7)"), Value::Number(-4.0));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(eval("Math.max(1, 5, 3)"), Value::Number(5.0));
        assert_eq!(eval("Math.min(...[4, 2, 8])"), Value::Number(2.0));
        assert_eq!(eval("Math.max()"), Value::Number(f64::NEG_INFINITY));
        assert!(eval("Math.min(1, 'x')").as_number().unwrap().is_nan());
    }

    #[test]
    fn test_powers_and_roots() {
        assert_eq!(eval("Math.pow(2, 10)"), Value::Number(1024.0));
        assert_eq!(eval("Math.sqrt(16) + Math.cbrt(27)"), Value::Number(7.0));
        assert_eq!(eval("Math.hypot(3, 4)"), Value::Number(5.0));
        assert_eq!(eval("Math.abs(-3) * Math.sign(-2)"), Value::Number(-3.0));
    }

    #[test]
    fn test_random_range() {
        let engine = Engine::new();
        for _ in 0..100 {
            let n = engine.eval("Math.random()").unwrap().as_number().unwrap();
            assert!((0.0..1.0).contains(&n));
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("Math.PI"), Value::Number(std::f64::consts::PI));
        assert_eq!(eval("Object.keys(Math).length"), Value::Number(0.0));
    }
}
