// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in objects and constructors.
//!
//! - `console`
//! - `Object`, `Function.prototype`, `Array`, `String`, `Number`, `Boolean`
//! - `Math`, `JSON`
//! - `Error` and its subtypes
//! - Global functions (`parseInt`, `parseFloat`, `isNaN`, ...)

pub mod array;
pub mod console;
pub mod error;
pub mod function;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use crate::runtime::{ObjectRef, Value};
use crate::{Engine, Throw};
use std::rc::Rc;

/// Signature shared by every builtin function.
pub type Builtin = fn(&Engine, &Value, &[Value]) -> Result<Value, Throw>;

/// Registers all built-in functions and objects.
pub(crate) fn install(engine: &Engine) {
    object::register(engine);
    function::register(engine);
    error::register(engine);
    array::register(engine);
    string::register(engine);
    number::register(engine);
    math::register(engine);
    json::register(engine);
    global::register(engine);
    console::register(engine);
}

/// Defines a non-enumerable builtin method on `target`.
pub(crate) fn method(engine: &Engine, target: &ObjectRef, name: &str, arity: usize, f: Builtin) {
    target.define_hidden(name, engine.make_native(name, arity, Rc::new(f), false));
}

/// Creates a constructor function whose `prototype` is `prototype`.
pub(crate) fn constructor(
    engine: &Engine,
    name: &str,
    arity: usize,
    prototype: &ObjectRef,
    f: Builtin,
) -> ObjectRef {
    let constructor = engine.make_native(name, arity, Rc::new(f), true);
    constructor.define_hidden("prototype", prototype.clone());
    prototype.define_hidden("constructor", constructor.clone());
    constructor
}

/// Returns argument `i`, or undefined when absent.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Converts an argument to an integer the way index parameters do
/// (ToIntegerOrInfinity), defaulting to `default` when absent.
pub(crate) fn integer_arg(args: &[Value], i: usize, default: f64) -> f64 {
    match args.get(i) {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            if n.is_nan() { 0.0 } else { n.trunc() }
        }
    }
}

/// Resolves a relative index (negative counts from the end) into `0..=len`.
pub(crate) fn relative_index(n: f64, len: usize) -> usize {
    let len_f = len as f64;
    if n < 0.0 {
        (len_f + n).max(0.0) as usize
    } else {
        n.min(len_f) as usize
    }
}
