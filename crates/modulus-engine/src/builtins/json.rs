// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The JSON object, backed by `serde_json`.

use super::{arg, method};
use crate::builtins::error::ErrorKind;
use crate::runtime::{CircularStructure, ObjectRef, Value};
use crate::{Engine, Throw};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Largest integer that converts to a JSON integer without losing precision.
const MAX_EXACT_INTEGER: f64 = 9007199254740992.0;

pub(crate) fn register(engine: &Engine) {
    let json = engine.new_object();
    method(engine, &json, "parse", 2, parse);
    method(engine, &json, "stringify", 3, stringify);
    engine.set_global("JSON", Value::Object(json));
}

/// Converts a value to a JSON tree.
///
/// Functions and undefined have no JSON form: they yield `None` at the top
/// level, are skipped as object members and become `null` inside arrays.
pub(crate) fn to_json(value: &Value) -> Result<Option<serde_json::Value>, CircularStructure> {
    let mut stack = Vec::new();
    convert(value, &mut stack)
}

fn convert(
    value: &Value,
    stack: &mut Vec<ObjectRef>,
) -> Result<Option<serde_json::Value>, CircularStructure> {
    Ok(Some(match value {
        Value::Undefined => return Ok(None),
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Object(object) if object.is_callable() => return Ok(None),
        Value::Object(object) => {
            if stack.iter().any(|seen| seen.ptr_eq(object)) {
                return Err(CircularStructure);
            }
            stack.push(object.clone());
            let result = match object.array_elements() {
                Some(elements) => {
                    let mut items = Vec::with_capacity(elements.len());
                    for element in &elements {
                        items.push(convert(element, stack)?.unwrap_or(serde_json::Value::Null));
                    }
                    serde_json::Value::Array(items)
                }
                None => {
                    let mut map = serde_json::Map::new();
                    for key in object.keys() {
                        if let Some(member) = convert(&object.get(&key), stack)? {
                            map.insert(key.to_string(), member);
                        }
                    }
                    serde_json::Value::Object(map)
                }
            };
            stack.pop();
            result
        }
    }))
}

fn number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// The indentation requested by the `space` argument, if any.
fn indent(space: &Value) -> Option<String> {
    let indent = match space {
        Value::Number(n) if *n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => return None,
    };
    (!indent.is_empty()).then_some(indent)
}

/// Serializes a JSON tree, pretty-printed when `indent` is given.
pub fn serialize(json: &serde_json::Value, indent: Option<&str>) -> String {
    let Some(indent) = indent else {
        return json.to_string();
    };
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    if json.serialize(&mut serializer).is_err() {
        return json.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| json.to_string())
}

/// JSON.stringify(value, replacer, space)
///
/// A function replacer is not supported; an array replacer lists the keys
/// kept at every level.
pub fn stringify(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let value = arg(args, 0);
    let json = match value.to_json() {
        Ok(Some(json)) => json,
        Ok(None) => return Ok(Value::Undefined),
        Err(circular) => return Err(engine.throw(ErrorKind::TypeError, circular.to_string())),
    };

    let json = match arg(args, 1).as_object().and_then(ObjectRef::array_elements) {
        Some(allowed) => {
            let mut keys = Vec::new();
            for key in &allowed {
                keys.push(engine.to_string(key)?.to_string());
            }
            filter_keys(json, &keys)
        }
        None => json,
    };

    let indent = indent(&arg(args, 2));
    Ok(Value::from(serialize(&json, indent.as_deref())))
}

fn filter_keys(json: serde_json::Value, keys: &[String]) -> serde_json::Value {
    match json {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(key, _)| keys.contains(key))
                .map(|(key, value)| (key, filter_keys(value, keys)))
                .collect(),
        ),
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.into_iter().map(|item| filter_keys(item, keys)).collect(),
        ),
        other => other,
    }
}

/// JSON.parse(text, reviver)
pub fn parse(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let text = engine.to_string(&arg(args, 0))?;
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|err| {
        engine.throw(
            ErrorKind::SyntaxError,
            format!("Unexpected token in JSON: {}", err),
        )
    })?;
    let value = Value::from_json(engine, &json);

    let reviver = arg(args, 1);
    if !reviver.is_callable() {
        return Ok(value);
    }
    let holder = engine.new_object();
    holder.set("", value);
    revive(engine, &Value::Object(holder), "", &reviver)
}

/// Walks the parsed value bottom-up, replacing each member with the
/// reviver's result (members revived to undefined are removed).
fn revive(engine: &Engine, holder: &Value, key: &str, reviver: &Value) -> Result<Value, Throw> {
    let value = engine.get(holder, key)?;
    if let Value::Object(object) = &value {
        for child in object.keys() {
            let revived = revive(engine, &value, &child, reviver)?;
            if revived.is_undefined() && !object.is_array() {
                object.delete(&child);
            } else {
                object.set(&child, revived);
            }
        }
    }
    engine.call(reviver, holder.clone(), &[Value::from(key), value])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Value {
        Engine::new()
            .eval(source)
            .unwrap_or_else(|e| panic!("{}: {}", source, e))
    }

    #[test]
    fn test_stringify_compact() {
        assert_eq!(
            eval("JSON.stringify({ name: 'app', port: 8080, debug: false, tags: ['a', 1, null] })"),
            Value::from(r#"{"name":"app","port":8080,"debug":false,"tags":["a",1,null]}"#)
        );
        assert_eq!(eval("JSON.stringify(1.5)"), Value::from("1.5"));
        assert_eq!(eval("JSON.stringify('x')"), Value::from("\"x\""));
    }

    #[test]
    fn test_stringify_skips_functions_and_undefined() {
        assert_eq!(
            eval("JSON.stringify({ a: undefined, f() {}, b: [undefined, () => 1], n: NaN })"),
            Value::from(r#"{"b":[null,null],"n":null}"#)
        );
        assert_eq!(eval("JSON.stringify(undefined)"), Value::Undefined);
    }

    #[test]
    fn test_stringify_indent() {
        assert_eq!(
            eval("JSON.stringify({ a: 1, b: [2] }, null, 2)"),
            Value::from("{\n  \"a\": 1,\n  \"b\": [\n    2\n  ]\n}")
        );
        assert_eq!(
            eval("JSON.stringify({ a: 1 }, null, '\\t')"),
            Value::from("{\n\t\"a\": 1\n}")
        );
    }

    #[test]
    fn test_stringify_key_filter() {
        assert_eq!(
            eval("JSON.stringify({ a: 1, b: 2, c: { a: 3, d: 4 } }, ['a', 'c'])"),
            Value::from(r#"{"a":1,"c":{"a":3}}"#)
        );
    }

    #[test]
    fn test_stringify_circular() {
        let err = Engine::new()
            .eval("const o = {}; o.self = o; JSON.stringify(o)")
            .unwrap_err();
        let exception = err.exception().unwrap();
        assert_eq!(exception.name(), "TypeError");
        assert_eq!(exception.message(), "Converting circular structure to JSON");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            eval("const c = JSON.parse('{\"server\": {\"port\": 3000}, \"list\": [1, 2]}'); c.server.port + c.list.length"),
            Value::Number(3002.0)
        );
        let err = Engine::new().eval("JSON.parse('{bad')").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "SyntaxError");
    }

    #[test]
    fn test_parse_reviver() {
        assert_eq!(
            eval("const o = JSON.parse('{\"a\": 1, \"b\": 2}', (k, v) => k === 'a' ? undefined : v); JSON.stringify(o)"),
            Value::from(r#"{"b":2}"#)
        );
    }

    #[test]
    fn test_host_to_json() {
        let engine = Engine::new();
        let value = engine.eval("({ list: [1, 2.5], ok: true })").unwrap();
        assert_eq!(
            value.to_json().unwrap(),
            Some(serde_json::json!({ "list": [1, 2.5], "ok": true }))
        );
    }
}
