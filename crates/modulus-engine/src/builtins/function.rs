// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Function.prototype methods.

use super::{arg, constructor, method};
use crate::builtins::error::ErrorKind;
use crate::runtime::{Function, Value};
use crate::{Engine, Throw};
use std::rc::Rc;

pub(crate) fn register(engine: &Engine) {
    let prototype = engine.context().intrinsics.function_prototype.clone();
    method(engine, &prototype, "call", 1, call);
    method(engine, &prototype, "apply", 2, apply);
    method(engine, &prototype, "bind", 1, bind);
    method(engine, &prototype, "toString", 0, function_to_string);

    let function = constructor(engine, "Function", 1, &prototype, function_constructor);
    engine.set_global("Function", Value::Object(function));
}

fn require_callable(engine: &Engine, this: &Value, method: &str) -> Result<(), Throw> {
    if this.is_callable() {
        Ok(())
    } else {
        Err(engine.throw(
            ErrorKind::TypeError,
            format!("Function.prototype.{} called on a value that is not a function", method),
        ))
    }
}

/// Source text cannot be compiled at run time from inside scripts.
pub fn function_constructor(engine: &Engine, _this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Err(engine.throw(
        ErrorKind::TypeError,
        "Code generation from strings is not allowed",
    ))
}

/// Function.prototype.call(thisArg, ...args)
pub fn call(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    require_callable(engine, this, "call")?;
    let rest = args.get(1..).unwrap_or(&[]);
    engine.call(this, arg(args, 0), rest)
}

/// Function.prototype.apply(thisArg, argsArray)
pub fn apply(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    require_callable(engine, this, "apply")?;
    let list = match arg(args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        Value::Object(object) => match object.array_elements() {
            Some(elements) => elements,
            None => {
                return Err(engine.throw(
                    ErrorKind::TypeError,
                    "CreateListFromArrayLike called on non-array",
                ));
            }
        },
        _ => {
            return Err(engine.throw(
                ErrorKind::TypeError,
                "CreateListFromArrayLike called on non-object",
            ));
        }
    };
    engine.call(this, arg(args, 0), &list)
}

/// Function.prototype.bind(thisArg, ...args)
pub fn bind(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    require_callable(engine, this, "bind")?;
    let target = this.clone();
    let bound_this = arg(args, 0);
    let bound_args: Rc<[Value]> = args.get(1..).unwrap_or(&[]).into();

    let name = match &target {
        Value::Object(object) => format!("bound {}", object.function_name()),
        _ => "bound ".to_string(),
    };
    let bound = engine.native_function(&name, 0, move |engine, _this, args| {
        let mut all = bound_args.to_vec();
        all.extend_from_slice(args);
        engine.call(&target, bound_this.clone(), &all)
    });
    Ok(Value::Object(bound))
}

/// Function.prototype.toString()
pub fn function_to_string(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let Some((object, function)) = this.as_object().and_then(|o| Some((o, o.function()?))) else {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "Function.prototype.toString requires that 'this' be a Function",
        ));
    };
    let name = object.function_name();
    let text = match &*function {
        _ if function.is_class_constructor() => format!("class {} {{ }}", name),
        Function::Script(_) => format!("function {}() {{ [code] }}", name),
        Function::Native(_) => format!("function {}() {{ [native code] }}", name),
    };
    Ok(Value::from(text))
}
