// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! String constructor and String.prototype methods.
//!
//! Positions and lengths count Unicode scalar values.

use super::{arg, constructor, integer_arg, method, relative_index};
use crate::builtins::error::ErrorKind;
use crate::runtime::Value;
use crate::{Engine, Throw};
use std::rc::Rc;

/// Longest string, in characters, a builtin may produce
const MAX_STRING_LENGTH: usize = (1 << 30) - 25;

pub(crate) fn register(engine: &Engine) {
    let prototype = engine.context().intrinsics.string_prototype.clone();
    method(engine, &prototype, "charAt", 1, char_at);
    method(engine, &prototype, "charCodeAt", 1, char_code_at);
    method(engine, &prototype, "at", 1, at);
    method(engine, &prototype, "indexOf", 1, index_of);
    method(engine, &prototype, "lastIndexOf", 1, last_index_of);
    method(engine, &prototype, "includes", 1, includes);
    method(engine, &prototype, "startsWith", 1, starts_with);
    method(engine, &prototype, "endsWith", 1, ends_with);
    method(engine, &prototype, "slice", 2, slice);
    method(engine, &prototype, "substring", 2, substring);
    method(engine, &prototype, "toUpperCase", 0, to_upper_case);
    method(engine, &prototype, "toLowerCase", 0, to_lower_case);
    method(engine, &prototype, "trim", 0, trim);
    method(engine, &prototype, "trimStart", 0, trim_start);
    method(engine, &prototype, "trimEnd", 0, trim_end);
    method(engine, &prototype, "split", 2, split);
    method(engine, &prototype, "replace", 2, replace);
    method(engine, &prototype, "replaceAll", 2, replace_all);
    method(engine, &prototype, "repeat", 1, repeat);
    method(engine, &prototype, "padStart", 2, pad_start);
    method(engine, &prototype, "padEnd", 2, pad_end);
    method(engine, &prototype, "concat", 1, concat);
    method(engine, &prototype, "toString", 0, to_string);
    method(engine, &prototype, "valueOf", 0, to_string);

    let string = constructor(engine, "String", 1, &prototype, string_constructor);
    method(engine, &string, "fromCharCode", 1, from_char_code);
    engine.set_global("String", Value::Object(string));
}

fn this_string(engine: &Engine, this: &Value, name: &str) -> Result<Rc<str>, Throw> {
    match this {
        Value::String(s) => Ok(s.clone()),
        Value::Undefined | Value::Null => Err(engine.throw(
            ErrorKind::TypeError,
            format!("String.prototype.{} called on null or undefined", name),
        )),
        other => engine.to_string(other),
    }
}

fn string_arg(engine: &Engine, args: &[Value], i: usize) -> Result<Rc<str>, Throw> {
    engine.to_string(&arg(args, i))
}

/// Byte offset of the `n`th character (or the end of the string).
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Characters `start..end` of `s`.
fn substr(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    &s[byte_offset(s, start)..byte_offset(s, end)]
}

/// Character index of the first match of `needle` at or after `from`.
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let offset = byte_offset(haystack, from);
    haystack[offset..]
        .find(needle)
        .map(|i| from + char_count(&haystack[offset..offset + i]))
}

/// `String(value)`; symbols aside this is ToString.
pub fn string_constructor(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    if args.is_empty() {
        return Ok(Value::from(""));
    }
    Ok(Value::String(string_arg(engine, args, 0)?))
}

/// String.fromCharCode(...codes)
pub fn from_char_code(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let units: Vec<u16> = args.iter().map(|v| v.to_number() as i64 as u16).collect();
    Ok(Value::from(String::from_utf16_lossy(&units)))
}

/// String.prototype.charAt(index)
pub fn char_at(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "charAt")?;
    let index = integer_arg(args, 0, 0.0);
    let c = if index < 0.0 {
        None
    } else {
        s.chars().nth(index as usize)
    };
    Ok(Value::from(c.map(String::from).unwrap_or_default()))
}

/// String.prototype.charCodeAt(index)
pub fn char_code_at(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "charCodeAt")?;
    let index = integer_arg(args, 0, 0.0);
    let code = if index < 0.0 {
        None
    } else {
        s.chars().nth(index as usize).map(|c| c as u32 as f64)
    };
    Ok(Value::Number(code.unwrap_or(f64::NAN)))
}

/// String.prototype.at(index)
pub fn at(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "at")?;
    let len = char_count(&s) as f64;
    let mut index = integer_arg(args, 0, 0.0);
    if index < 0.0 {
        index += len;
    }
    if index < 0.0 || index >= len {
        return Ok(Value::Undefined);
    }
    Ok(s
        .chars()
        .nth(index as usize)
        .map(|c| Value::from(c.to_string()))
        .unwrap_or_default())
}

/// String.prototype.indexOf(search, position)
pub fn index_of(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "indexOf")?;
    let needle = string_arg(engine, args, 0)?;
    let from = relative_index(integer_arg(args, 1, 0.0).max(0.0), char_count(&s));
    Ok(Value::Number(
        find_from(&s, &needle, from).map(|i| i as f64).unwrap_or(-1.0),
    ))
}

/// String.prototype.lastIndexOf(search)
pub fn last_index_of(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "lastIndexOf")?;
    let needle = string_arg(engine, args, 0)?;
    Ok(Value::Number(
        s.rfind(&*needle)
            .map(|i| char_count(&s[..i]) as f64)
            .unwrap_or(-1.0),
    ))
}

/// String.prototype.includes(search, position)
pub fn includes(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "includes")?;
    let needle = string_arg(engine, args, 0)?;
    let from = relative_index(integer_arg(args, 1, 0.0).max(0.0), char_count(&s));
    Ok(Value::Boolean(find_from(&s, &needle, from).is_some()))
}

/// String.prototype.startsWith(search, position)
pub fn starts_with(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "startsWith")?;
    let needle = string_arg(engine, args, 0)?;
    let from = relative_index(integer_arg(args, 1, 0.0).max(0.0), char_count(&s));
    Ok(Value::Boolean(s[byte_offset(&s, from)..].starts_with(&*needle)))
}

/// String.prototype.endsWith(search, length)
pub fn ends_with(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "endsWith")?;
    let needle = string_arg(engine, args, 0)?;
    let len = char_count(&s);
    let end = relative_index(integer_arg(args, 1, len as f64).max(0.0), len);
    Ok(Value::Boolean(substr(&s, 0, end).ends_with(&*needle)))
}

/// String.prototype.slice(start, end)
pub fn slice(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "slice")?;
    let len = char_count(&s);
    let start = relative_index(integer_arg(args, 0, 0.0), len);
    let end = relative_index(integer_arg(args, 1, len as f64), len);
    Ok(Value::from(substr(&s, start, end)))
}

/// String.prototype.substring(start, end)
pub fn substring(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "substring")?;
    let len = char_count(&s);
    let clamp = |n: f64| n.max(0.0).min(len as f64) as usize;
    let start = clamp(integer_arg(args, 0, 0.0));
    let end = clamp(integer_arg(args, 1, len as f64));
    Ok(Value::from(substr(&s, start.min(end), start.max(end))))
}

/// String.prototype.toUpperCase()
pub fn to_upper_case(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(this_string(engine, this, "toUpperCase")?.to_uppercase()))
}

/// String.prototype.toLowerCase()
pub fn to_lower_case(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(this_string(engine, this, "toLowerCase")?.to_lowercase()))
}

/// String.prototype.trim()
pub fn trim(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(this_string(engine, this, "trim")?.trim()))
}

/// String.prototype.trimStart()
pub fn trim_start(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(this_string(engine, this, "trimStart")?.trim_start()))
}

/// String.prototype.trimEnd()
pub fn trim_end(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::from(this_string(engine, this, "trimEnd")?.trim_end()))
}

/// String.prototype.split(separator, limit)
pub fn split(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "split")?;
    let limit = match arg(args, 1) {
        Value::Undefined => usize::MAX,
        value => value.to_number().max(0.0) as usize,
    };

    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::String(s.clone())],
        separator => {
            let separator = engine.to_string(&separator)?;
            if separator.is_empty() {
                s.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                s.split(&*separator).map(Value::from).collect()
            }
        }
    };

    Ok(Value::Object(
        engine.new_array(parts.into_iter().take(limit).collect()),
    ))
}

/// Computes the replacement text for one match.
fn replacement(
    engine: &Engine,
    replacer: &Value,
    matched: &str,
    position: usize,
    whole: &Rc<str>,
) -> Result<String, Throw> {
    if replacer.is_callable() {
        let result = engine.call(
            replacer,
            Value::Undefined,
            &[
                Value::from(matched),
                Value::from(position),
                Value::String(whole.clone()),
            ],
        )?;
        return Ok(engine.to_string(&result)?.to_string());
    }
    let template = engine.to_string(replacer)?;
    Ok(template.replace("$&", matched).replace("$$", "$"))
}

fn replace_impl(engine: &Engine, this: &Value, args: &[Value], all: bool) -> Result<Value, Throw> {
    let s = this_string(engine, this, if all { "replaceAll" } else { "replace" })?;
    let pattern = string_arg(engine, args, 0)?;
    let replacer = arg(args, 1);

    let mut out = String::new();
    let mut last = 0;
    let mut search_from = 0;
    while let Some(found) = s[search_from..].find(&*pattern).map(|i| i + search_from) {
        out.push_str(&s[last..found]);
        out.push_str(&replacement(
            engine,
            &replacer,
            &pattern,
            char_count(&s[..found]),
            &s,
        )?);
        last = found + pattern.len();
        if !all {
            break;
        }
        search_from = if pattern.is_empty() {
            match s[found..].chars().next() {
                Some(c) => found + c.len_utf8(),
                None => break,
            }
        } else {
            last
        };
        if pattern.is_empty() {
            out.push_str(&s[last..search_from]);
            last = search_from;
        }
    }
    out.push_str(&s[last..]);
    Ok(Value::from(out))
}

/// String.prototype.replace(pattern, replacement) for string patterns
pub fn replace(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    replace_impl(engine, this, args, false)
}

/// String.prototype.replaceAll(pattern, replacement) for string patterns
pub fn replace_all(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    replace_impl(engine, this, args, true)
}

/// String.prototype.repeat(count)
pub fn repeat(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let s = this_string(engine, this, "repeat")?;
    let count = integer_arg(args, 0, 0.0);
    if count < 0.0 || count.is_infinite() {
        return Err(engine.throw(
            ErrorKind::RangeError,
            format!("Invalid count value: {}", crate::runtime::number_to_string(count)),
        ));
    }
    if s.is_empty() || count == 0.0 {
        return Ok(Value::from(""));
    }
    if char_count(&s) as f64 * count > MAX_STRING_LENGTH as f64 {
        return Err(invalid_length(engine));
    }
    Ok(Value::from(s.repeat(count as usize)))
}

fn invalid_length(engine: &Engine) -> Throw {
    engine.throw(ErrorKind::RangeError, "Invalid string length")
}

fn pad(engine: &Engine, this: &Value, args: &[Value], at_start: bool) -> Result<Value, Throw> {
    let s = this_string(engine, this, if at_start { "padStart" } else { "padEnd" })?;
    let target = integer_arg(args, 0, 0.0).max(0.0);
    let filler = match arg(args, 1) {
        Value::Undefined => Rc::from(" "),
        value => engine.to_string(&value)?,
    };

    let len = char_count(&s);
    if target <= len as f64 || filler.is_empty() {
        return Ok(Value::String(s));
    }
    if target > MAX_STRING_LENGTH as f64 {
        return Err(invalid_length(engine));
    }
    let target = target as usize;
    let padding: String = filler.chars().cycle().take(target - len).collect();
    Ok(Value::from(if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    }))
}

/// String.prototype.padStart(length, filler)
pub fn pad_start(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    pad(engine, this, args, true)
}

/// String.prototype.padEnd(length, filler)
pub fn pad_end(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    pad(engine, this, args, false)
}

/// String.prototype.concat(...values)
pub fn concat(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let mut out = this_string(engine, this, "concat")?.to_string();
    for value in args {
        out.push_str(&engine.to_string(value)?);
    }
    Ok(Value::from(out))
}

/// String.prototype.toString() / valueOf()
pub fn to_string(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    match this {
        Value::String(_) => Ok(this.clone()),
        _ => Err(engine.throw(
            ErrorKind::TypeError,
            "String.prototype.toString requires that 'this' be a String",
        )),
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
    fn test_case_and_trim() {
        assert_eq!(eval("'  Hello '.trim().toUpperCase()"), Value::from("HELLO"));
        assert_eq!(eval("'ABC'.toLowerCase()"), Value::from("abc"));
        assert_eq!(eval("'  x'.trimStart() + '|' + 'y  '.trimEnd()"), Value::from("x|y"));
    }

    #[test]
    fn test_search_methods() {
        assert_eq!(eval("'math.js'.endsWith('.js')"), Value::Boolean(true));
        assert_eq!(eval("'./math'.startsWith('./')"), Value::Boolean(true));
        assert_eq!(eval("'a-b-c'.indexOf('-', 2)"), Value::Number(3.0));
        assert_eq!(eval("'a-b-c'.lastIndexOf('-')"), Value::Number(3.0));
        assert_eq!(eval("'héllo'.indexOf('l')"), Value::Number(2.0));
        assert_eq!(eval("'calculator'.includes('calc')"), Value::Boolean(true));
    }

    #[test]
    fn test_slicing() {
        assert_eq!(eval("'calculator'.slice(-4)"), Value::from("ator"));
        assert_eq!(eval("'calculator'.slice(0, 4)"), Value::from("calc"));
        assert_eq!(eval("'calculator'.substring(4, 0)"), Value::from("calc"));
        assert_eq!(eval("'abc'.charAt(1) + 'abc'.at(-1)"), Value::from("bc"));
        assert_eq!(eval("'abc'.length"), Value::Number(3.0));
        assert_eq!(eval("'A'.charCodeAt(0)"), Value::Number(65.0));
    }

    #[test]
    fn test_split() {
        assert_eq!(eval("'a,b,,c'.split(',').length"), Value::Number(4.0));
        assert_eq!(eval("'abc'.split('').join('-')"), Value::from("a-b-c"));
        assert_eq!(eval("'a b c'.split(' ', 2).join()"), Value::from("a,b"));
        assert_eq!(eval("'abc'.split().length"), Value::Number(1.0));
    }

    #[test]
    fn test_replace() {
        assert_eq!(eval("'1 + 1'.replace('1', 'one')"), Value::from("one + 1"));
        assert_eq!(eval("'1 + 1'.replaceAll('1', 'one')"), Value::from("one + one"));
        assert_eq!(
            eval("'a-b'.replace('-', (m, i) => '[' + m + i + ']')"),
            Value::from("a[-1]b")
        );
        assert_eq!(eval("'ab'.replaceAll('', '.')"), Value::from(".a.b."));
    }

    #[test]
    fn test_padding_and_repeat() {
        assert_eq!(eval("'5'.padStart(3, '0')"), Value::from("005"));
        assert_eq!(eval("'ab'.padEnd(5, 'xy')"), Value::from("abxyx"));
        assert_eq!(eval("'=' .repeat(3)"), Value::from("==="));
        let err = Engine::new().eval("'x'.repeat(-1)").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "RangeError");
    }

    #[test]
    fn test_oversized_results_throw_range_error() {
        for source in [
            "'abc'.padStart(1e12)",
            "'abc'.padEnd(2 ** 31, '-')",
            "'a'.repeat(2 ** 40)",
            "'ab'.repeat(2 ** 29)",
        ] {
            let err = Engine::new().eval(source).unwrap_err();
            let exception = err.exception().unwrap();
            assert_eq!(exception.name(), "RangeError", "{}", source);
            assert_eq!(exception.message(), "Invalid string length", "{}", source);
        }
        assert_eq!(eval("''.repeat(2 ** 40)"), Value::from(""));
        assert_eq!(eval("'abc'.padStart(1e12, '')"), Value::from("abc"));
        assert_eq!(eval("'a'.repeat(1024).length"), Value::Number(1024.0));
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(eval("String(42) + String(null) + String()"), Value::from("42null"));
        assert_eq!(eval("String.fromCharCode(72, 105)"), Value::from("Hi"));
        assert_eq!(eval("'a'.concat(1, true)"), Value::from("a1true"));
    }
}
