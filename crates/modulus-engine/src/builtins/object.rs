// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Object constructor and methods.

use super::{arg, constructor, method};
use crate::builtins::error::ErrorKind;
use crate::runtime::{ObjectKind, ObjectRef, Value};
use crate::{Engine, Throw};
use std::rc::Rc;

pub(crate) fn register(engine: &Engine) {
    let prototype = engine.context().intrinsics.object_prototype.clone();
    method(engine, &prototype, "hasOwnProperty", 1, has_own_property);
    method(engine, &prototype, "toString", 0, object_to_string);
    method(engine, &prototype, "valueOf", 0, value_of);

    let object = constructor(engine, "Object", 1, &prototype, object_constructor);
    method(engine, &object, "keys", 1, keys);
    method(engine, &object, "values", 1, values);
    method(engine, &object, "entries", 1, entries);
    method(engine, &object, "assign", 2, assign);
    method(engine, &object, "freeze", 1, freeze);
    method(engine, &object, "isFrozen", 1, is_frozen);
    method(engine, &object, "create", 1, create);
    method(engine, &object, "getPrototypeOf", 1, get_prototype_of);
    method(engine, &object, "fromEntries", 1, from_entries);
    engine.set_global("Object", Value::Object(object));
}

/// `Object(value)` / `new Object()`
pub fn object_constructor(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    match (arg(args, 0), this) {
        (value @ Value::Object(_), _) => Ok(value),
        // Under `new` the receiver is the allocated instance
        (_, Value::Object(instance)) if !instance.is_callable() => Ok(this.clone()),
        _ => Ok(Value::Object(engine.new_object())),
    }
}

/// Own enumerable keys of any value; primitives other than strings have
/// none.
fn own_keys(engine: &Engine, value: &Value) -> Result<Vec<Rc<str>>, Throw> {
    match value {
        Value::Undefined | Value::Null => Err(engine.throw(
            ErrorKind::TypeError,
            "Cannot convert undefined or null to object",
        )),
        Value::Object(object) => Ok(object.keys()),
        Value::String(s) => Ok((0..s.chars().count()).map(|i| Rc::from(i.to_string())).collect()),
        _ => Ok(Vec::new()),
    }
}

/// Object.keys(obj)
pub fn keys(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let target = arg(args, 0);
    let keys = own_keys(engine, &target)?;
    Ok(Value::Object(engine.new_array(
        keys.into_iter().map(Value::String).collect(),
    )))
}

/// Object.values(obj)
pub fn values(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let target = arg(args, 0);
    let mut values = Vec::new();
    for key in own_keys(engine, &target)? {
        values.push(engine.get(&target, &key)?);
    }
    Ok(Value::Object(engine.new_array(values)))
}

/// Object.entries(obj)
pub fn entries(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let target = arg(args, 0);
    let mut entries = Vec::new();
    for key in own_keys(engine, &target)? {
        let value = engine.get(&target, &key)?;
        let pair = engine.new_array(vec![Value::String(key), value]);
        entries.push(Value::Object(pair));
    }
    Ok(Value::Object(engine.new_array(entries)))
}

/// Object.fromEntries(pairs)
pub fn from_entries(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let result = engine.new_object();
    let pairs = match arg(args, 0) {
        Value::Object(list) => list.array_elements(),
        _ => None,
    };
    let Some(pairs) = pairs else {
        return Err(engine.throw(ErrorKind::TypeError, "Object.fromEntries requires an array"));
    };
    for pair in pairs {
        let key = engine.get(&pair, "0")?;
        let value = engine.get(&pair, "1")?;
        result.set(&engine.to_string(&key)?, value);
    }
    Ok(Value::Object(result))
}

/// Object.assign(target, ...sources)
pub fn assign(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let target = arg(args, 0);
    let Value::Object(target_object) = &target else {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "Cannot convert undefined or null to object",
        ));
    };

    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for key in own_keys(engine, source)? {
            let value = engine.get(source, &key)?;
            if !target_object.set(&key, value) {
                return Err(engine.throw(
                    ErrorKind::TypeError,
                    format!("Cannot assign to read only property '{}' of object", key),
                ));
            }
        }
    }
    Ok(target)
}

/// Object.freeze(obj)
pub fn freeze(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let target = arg(args, 0);
    if let Value::Object(object) = &target {
        object.freeze();
    }
    Ok(target)
}

/// Object.isFrozen(obj)
pub fn is_frozen(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(match arg(args, 0) {
        Value::Object(object) => object.is_frozen(),
        _ => true,
    }))
}

/// Object.create(proto)
pub fn create(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let prototype = match arg(args, 0) {
        Value::Object(object) => Some(object),
        Value::Null => None,
        _ => {
            return Err(engine.throw(
                ErrorKind::TypeError,
                "Object prototype may only be an Object or null",
            ));
        }
    };
    Ok(Value::Object(ObjectRef::new(ObjectKind::Ordinary, prototype)))
}

/// Object.getPrototypeOf(obj)
pub fn get_prototype_of(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let intrinsics = &engine.context().intrinsics;
    let prototype = match arg(args, 0) {
        Value::Object(object) => object.prototype(),
        Value::String(_) => Some(intrinsics.string_prototype.clone()),
        Value::Number(_) => Some(intrinsics.number_prototype.clone()),
        Value::Boolean(_) => Some(intrinsics.boolean_prototype.clone()),
        Value::Undefined | Value::Null => {
            return Err(engine.throw(
                ErrorKind::TypeError,
                "Cannot convert undefined or null to object",
            ));
        }
    };
    Ok(prototype.map(Value::Object).unwrap_or(Value::Null))
}

/// Object.prototype.hasOwnProperty(key)
pub fn has_own_property(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let key = engine.to_string(&arg(args, 0))?;
    Ok(Value::Boolean(match this {
        Value::Object(object) => object.has_own(&key),
        Value::String(s) => {
            &*key == "length"
                || crate::runtime::array_index(&key).is_some_and(|i| i < s.chars().count())
        }
        _ => false,
    }))
}

/// Object.prototype.toString()
pub fn object_to_string(_engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let tag = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Object(object) if object.is_array() => "Array",
        Value::Object(object) if object.is_callable() => "Function",
        Value::Object(object) if object.is_error() => "Error",
        Value::Object(_) => "Object",
        Value::String(_) => "String",
        Value::Number(_) => "Number",
        Value::Boolean(_) => "Boolean",
    };
    Ok(Value::from(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf()
pub fn value_of(_engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(this.clone())
}
