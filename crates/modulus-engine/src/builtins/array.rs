// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Array constructor and Array.prototype methods.

use super::{arg, constructor, integer_arg, method, relative_index};
use crate::builtins::error::ErrorKind;
use crate::runtime::{ObjectRef, Value};
use crate::{Engine, Throw};
use std::cmp::Ordering;

/// Most elements `Array(n)` or `Array.from` will allocate up front
const MAX_ARRAY_LENGTH: usize = 1 << 24;

pub(crate) fn register(engine: &Engine) {
    let prototype = engine.context().intrinsics.array_prototype.clone();
    method(engine, &prototype, "push", 1, push);
    method(engine, &prototype, "pop", 0, pop);
    method(engine, &prototype, "shift", 0, shift);
    method(engine, &prototype, "unshift", 1, unshift);
    method(engine, &prototype, "join", 1, join);
    method(engine, &prototype, "toString", 0, array_to_string);
    method(engine, &prototype, "indexOf", 1, index_of);
    method(engine, &prototype, "lastIndexOf", 1, last_index_of);
    method(engine, &prototype, "includes", 1, includes);
    method(engine, &prototype, "slice", 2, slice);
    method(engine, &prototype, "splice", 2, splice);
    method(engine, &prototype, "concat", 1, concat);
    method(engine, &prototype, "reverse", 0, reverse);
    method(engine, &prototype, "sort", 1, sort);
    method(engine, &prototype, "fill", 1, fill);
    method(engine, &prototype, "flat", 0, flat);
    method(engine, &prototype, "map", 1, map);
    method(engine, &prototype, "filter", 1, filter);
    method(engine, &prototype, "forEach", 1, for_each);
    method(engine, &prototype, "reduce", 1, reduce);
    method(engine, &prototype, "find", 1, find);
    method(engine, &prototype, "findIndex", 1, find_index);
    method(engine, &prototype, "some", 1, some);
    method(engine, &prototype, "every", 1, every);

    let array = constructor(engine, "Array", 1, &prototype, array_constructor);
    method(engine, &array, "isArray", 1, is_array);
    method(engine, &array, "of", 0, array_of);
    method(engine, &array, "from", 1, array_from);
    engine.set_global("Array", Value::Object(array));
}

fn this_array(engine: &Engine, this: &Value, name: &str) -> Result<ObjectRef, Throw> {
    match this {
        Value::Object(object) if object.is_array() => Ok(object.clone()),
        _ => Err(engine.throw(
            ErrorKind::TypeError,
            format!("Array.prototype.{} called on non-array", name),
        )),
    }
}

fn elements(array: &ObjectRef) -> Vec<Value> {
    array.array_elements().unwrap_or_default()
}

fn callback(engine: &Engine, args: &[Value]) -> Result<Value, Throw> {
    let f = arg(args, 0);
    if f.is_callable() {
        Ok(f)
    } else {
        Err(engine.throw(
            ErrorKind::TypeError,
            format!("{} is not a function", engine.inspect(&f)),
        ))
    }
}

/// Runs `f` on the elements of an unfrozen array.
fn mutate<R>(
    engine: &Engine,
    array: &ObjectRef,
    f: impl FnOnce(&mut Vec<Value>) -> R,
) -> Result<R, Throw> {
    array.with_elements_mut(f).ok_or_else(|| {
        engine.throw(ErrorKind::TypeError, "Cannot modify a frozen array")
    })
}

/// `Array(n)`, `Array(a, b, ...)`
pub fn array_constructor(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    if let [Value::Number(n)] = args {
        if n.fract() != 0.0 || *n < 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
            return Err(invalid_length(engine));
        }
        return Ok(Value::Object(engine.new_array(vec![Value::Undefined; *n as usize])));
    }
    Ok(Value::Object(engine.new_array(args.to_vec())))
}

fn invalid_length(engine: &Engine) -> Throw {
    engine.throw(ErrorKind::RangeError, "Invalid array length")
}

/// Array.isArray(value)
pub fn is_array(_engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Object(o) if o.is_array())))
}

/// Array.of(...items)
pub fn array_of(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    Ok(Value::Object(engine.new_array(args.to_vec())))
}

/// Array.from(iterable, mapFn?)
pub fn array_from(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let source = arg(args, 0);
    let items = match &source {
        Value::String(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
        Value::Object(object) => match object.array_elements() {
            Some(elements) => elements,
            None => {
                let length = engine.get(&source, "length")?.to_number();
                let length = if length.is_nan() { 0.0 } else { length.trunc().max(0.0) };
                if length > MAX_ARRAY_LENGTH as f64 {
                    return Err(invalid_length(engine));
                }
                let length = length as usize;
                let mut items = Vec::with_capacity(length);
                for i in 0..length {
                    items.push(engine.get(&source, &i.to_string())?);
                }
                items
            }
        },
        Value::Undefined | Value::Null => {
            return Err(engine.throw(
                ErrorKind::TypeError,
                format!("{} is not iterable", source.to_display_string()),
            ));
        }
        _ => Vec::new(),
    };

    let map_fn = arg(args, 1);
    if map_fn.is_undefined() {
        return Ok(Value::Object(engine.new_array(items)));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(engine.call(&map_fn, Value::Undefined, &[item, Value::from(i)])?);
    }
    Ok(Value::Object(engine.new_array(mapped)))
}

/// Array.prototype.push(...items)
pub fn push(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "push")?;
    let length = mutate(engine, &array, |elements| {
        elements.extend_from_slice(args);
        elements.len()
    })?;
    Ok(Value::from(length))
}

/// Array.prototype.pop()
pub fn pop(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "pop")?;
    Ok(mutate(engine, &array, |elements| elements.pop())?.unwrap_or_default())
}

/// Array.prototype.shift()
pub fn shift(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "shift")?;
    let first = mutate(engine, &array, |elements| {
        if elements.is_empty() {
            None
        } else {
            Some(elements.remove(0))
        }
    })?;
    Ok(first.unwrap_or_default())
}

/// Array.prototype.unshift(...items)
pub fn unshift(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "unshift")?;
    let length = mutate(engine, &array, |elements| {
        elements.splice(0..0, args.iter().cloned());
        elements.len()
    })?;
    Ok(Value::from(length))
}

/// Array.prototype.join(separator)
pub fn join(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "join")?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".into(),
        value => engine.to_string(&value)?,
    };

    let mut parts = Vec::new();
    for element in elements(&array) {
        parts.push(match element {
            Value::Undefined | Value::Null => "".into(),
            // Self-references print as empty
            Value::Object(ref inner) if inner.ptr_eq(&array) => "".into(),
            other => engine.to_string(&other)?,
        });
    }
    Ok(Value::from(parts.join(&*separator)))
}

/// Array.prototype.toString()
pub fn array_to_string(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    join(engine, this, &[])
}

/// Array.prototype.indexOf(value, fromIndex)
pub fn index_of(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let items = elements(&this_array(engine, this, "indexOf")?);
    let needle = arg(args, 0);
    let start = relative_index(integer_arg(args, 1, 0.0), items.len());
    let found = items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| item.strict_equals(&needle))
        .map(|(i, _)| i as f64);
    Ok(Value::Number(found.unwrap_or(-1.0)))
}

/// Array.prototype.lastIndexOf(value)
pub fn last_index_of(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let items = elements(&this_array(engine, this, "lastIndexOf")?);
    let needle = arg(args, 0);
    let found = items
        .iter()
        .rposition(|item| item.strict_equals(&needle))
        .map(|i| i as f64);
    Ok(Value::Number(found.unwrap_or(-1.0)))
}

/// Array.prototype.includes(value, fromIndex)
pub fn includes(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let items = elements(&this_array(engine, this, "includes")?);
    let needle = arg(args, 0);
    let start = relative_index(integer_arg(args, 1, 0.0), items.len());
    Ok(Value::Boolean(
        items.iter().skip(start).any(|item| item.same_value_zero(&needle)),
    ))
}

/// Array.prototype.slice(start, end)
pub fn slice(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let items = elements(&this_array(engine, this, "slice")?);
    let len = items.len();
    let start = relative_index(integer_arg(args, 0, 0.0), len);
    let end = relative_index(integer_arg(args, 1, len as f64), len);
    let sliced = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::Object(engine.new_array(sliced)))
}

/// Array.prototype.splice(start, deleteCount, ...items)
pub fn splice(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "splice")?;
    let len = array.array_len().unwrap_or(0);
    let start = relative_index(integer_arg(args, 0, 0.0), len);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => (integer_arg(args, 1, 0.0).max(0.0) as usize).min(len - start),
    };
    let inserted = args.get(2..).unwrap_or(&[]).to_vec();

    let removed = mutate(engine, &array, |elements| {
        elements
            .splice(start..start + delete_count, inserted)
            .collect::<Vec<_>>()
    })?;
    Ok(Value::Object(engine.new_array(removed)))
}

/// Array.prototype.concat(...values)
pub fn concat(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let mut result = elements(&this_array(engine, this, "concat")?);
    for value in args {
        match value {
            Value::Object(object) if object.is_array() => result.extend(elements(object)),
            other => result.push(other.clone()),
        }
    }
    Ok(Value::Object(engine.new_array(result)))
}

/// Array.prototype.reverse()
pub fn reverse(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "reverse")?;
    mutate(engine, &array, |elements| elements.reverse())?;
    Ok(this.clone())
}

/// Array.prototype.fill(value, start, end)
pub fn fill(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "fill")?;
    let len = array.array_len().unwrap_or(0);
    let value = arg(args, 0);
    let start = relative_index(integer_arg(args, 1, 0.0), len);
    let end = relative_index(integer_arg(args, 2, len as f64), len);
    mutate(engine, &array, |elements| {
        for slot in elements.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
    })?;
    Ok(this.clone())
}

/// Array.prototype.flat(depth)
pub fn flat(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    fn flatten(items: Vec<Value>, depth: f64, out: &mut Vec<Value>) {
        for item in items {
            match &item {
                Value::Object(object) if depth >= 1.0 && object.is_array() => {
                    flatten(elements(object), depth - 1.0, out)
                }
                _ => out.push(item),
            }
        }
    }

    let items = elements(&this_array(engine, this, "flat")?);
    let mut out = Vec::new();
    flatten(items, integer_arg(args, 0, 1.0), &mut out);
    Ok(Value::Object(engine.new_array(out)))
}

/// Default sort order: undefined last, everything else by string form.
fn default_compare(engine: &Engine, a: &Value, b: &Value) -> Result<Ordering, Throw> {
    Ok(match (a, b) {
        (Value::Undefined, Value::Undefined) => Ordering::Equal,
        (Value::Undefined, _) => Ordering::Greater,
        (_, Value::Undefined) => Ordering::Less,
        _ => engine.to_string(a)?.cmp(&engine.to_string(b)?),
    })
}

/// Stable merge sort with a fallible comparator.
fn merge_sort(
    items: Vec<Value>,
    compare: &mut dyn FnMut(&Value, &Value) -> Result<Ordering, Throw>,
) -> Result<Vec<Value>, Throw> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(left, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        if compare(b, a)? == Ordering::Less {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Array.prototype.sort(compareFn)
pub fn sort(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "sort")?;
    let comparator = arg(args, 0);
    if !comparator.is_undefined() && !comparator.is_callable() {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "The comparison function must be either a function or undefined",
        ));
    }

    let mut compare = |a: &Value, b: &Value| -> Result<Ordering, Throw> {
        if comparator.is_undefined() || a.is_undefined() || b.is_undefined() {
            return default_compare(engine, a, b);
        }
        let result = engine
            .call(&comparator, Value::Undefined, &[a.clone(), b.clone()])?
            .to_number();
        Ok(if result < 0.0 {
            Ordering::Less
        } else if result > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        })
    };

    let sorted = merge_sort(elements(&array), &mut compare)?;
    mutate(engine, &array, |elements| *elements = sorted)?;
    Ok(this.clone())
}

/// Calls `f(element, index, array)` for each element until it returns
/// `Some`. The length is read once up front; indices the callback removes
/// are skipped.
fn visit<R>(
    engine: &Engine,
    this: &Value,
    args: &[Value],
    name: &str,
    mut f: impl FnMut(usize, &Value, Value) -> Option<R>,
) -> Result<Option<R>, Throw> {
    let array = this_array(engine, this, name)?;
    let callback = callback(engine, args)?;
    let this_arg = arg(args, 1);
    let len = array.array_len().unwrap_or(0);
    for i in 0..len {
        let Some(element) = array.array_element(i) else {
            continue;
        };
        let result = engine.call(
            &callback,
            this_arg.clone(),
            &[element.clone(), Value::from(i), this.clone()],
        )?;
        if let Some(found) = f(i, &element, result) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Array.prototype.map(fn)
pub fn map(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let len = this_array(engine, this, "map")?.array_len().unwrap_or(0);
    let mut mapped = vec![Value::Undefined; len];
    visit::<()>(engine, this, args, "map", |i, _, result| {
        mapped[i] = result;
        None
    })?;
    Ok(Value::Object(engine.new_array(mapped)))
}

/// Array.prototype.filter(fn)
pub fn filter(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let mut kept = Vec::new();
    visit::<()>(engine, this, args, "filter", |_, element, result| {
        if result.to_boolean() {
            kept.push(element.clone());
        }
        None
    })?;
    Ok(Value::Object(engine.new_array(kept)))
}

/// Array.prototype.forEach(fn)
pub fn for_each(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    visit::<()>(engine, this, args, "forEach", |_, _, _| None)?;
    Ok(Value::Undefined)
}

/// Array.prototype.find(fn)
pub fn find(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let found = visit(engine, this, args, "find", |_, element, result| {
        result.to_boolean().then(|| element.clone())
    })?;
    Ok(found.unwrap_or_default())
}

/// Array.prototype.findIndex(fn)
pub fn find_index(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let found = visit(engine, this, args, "findIndex", |i, _, result| {
        result.to_boolean().then_some(i as f64)
    })?;
    Ok(Value::Number(found.unwrap_or(-1.0)))
}

/// Array.prototype.some(fn)
pub fn some(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let found = visit(engine, this, args, "some", |_, _, result| {
        result.to_boolean().then_some(())
    })?;
    Ok(Value::Boolean(found.is_some()))
}

/// Array.prototype.every(fn)
pub fn every(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let failed = visit(engine, this, args, "every", |_, _, result| {
        (!result.to_boolean()).then_some(())
    })?;
    Ok(Value::Boolean(failed.is_none()))
}

/// Array.prototype.reduce(fn, initial)
pub fn reduce(engine: &Engine, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let array = this_array(engine, this, "reduce")?;
    let callback = callback(engine, args)?;
    let len = array.array_len().unwrap_or(0);
    let mut start = 0;

    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        match array.array_element(0) {
            Some(first) => {
                start = 1;
                first
            }
            None => {
                return Err(engine.throw(
                    ErrorKind::TypeError,
                    "Reduce of empty array with no initial value",
                ));
            }
        }
    };

    for i in start..len {
        let Some(element) = array.array_element(i) else {
            continue;
        };
        accumulator = engine.call(
            &callback,
            Value::Undefined,
            &[accumulator, element, Value::from(i), this.clone()],
        )?;
    }
    Ok(accumulator)
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
    fn test_push_pop_shift() {
        assert_eq!(
            eval("const a = [1, 2]; a.push(3, 4); a.pop(); a.shift(); a.unshift(0); a.join('-')"),
            Value::from("0-2-3")
        );
    }

    #[test]
    fn test_higher_order() {
        assert_eq!(
            eval("[1, 2, 3, 4].map(x => x * 2).filter(x => x > 2).reduce((a, b) => a + b, 0)"),
            Value::Number(18.0)
        );
        assert_eq!(eval("[5, 12, 8].find(x => x > 6)"), Value::Number(12.0));
        assert_eq!(eval("[5, 12, 8].findIndex(x => x > 100)"), Value::Number(-1.0));
        assert_eq!(eval("[1, 2].some(x => x === 2) && ![1, 2].every(x => x === 2)"), Value::Boolean(true));
    }

    #[test]
    fn test_reduce_without_initial_value() {
        assert_eq!(eval("[1, 2, 3].reduce((a, b) => a * b)"), Value::Number(6.0));
        let err = Engine::new().eval("[].reduce((a, b) => a + b)").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "TypeError");
    }

    #[test]
    fn test_search() {
        assert_eq!(eval("['a', 'b', 'a'].indexOf('a', 1)"), Value::Number(2.0));
        assert_eq!(eval("['a', 'b', 'a'].lastIndexOf('a')"), Value::Number(2.0));
        assert_eq!(eval("[NaN].includes(NaN)"), Value::Boolean(true));
        assert_eq!(eval("[NaN].indexOf(NaN)"), Value::Number(-1.0));
    }

    #[test]
    fn test_slice_splice_concat() {
        assert_eq!(eval("[1, 2, 3, 4].slice(1, -1).join()"), Value::from("2,3"));
        assert_eq!(
            eval("const a = [1, 2, 3, 4]; const removed = a.splice(1, 2, 'x'); a.join() + '|' + removed.join()"),
            Value::from("1,x,4|2,3")
        );
        assert_eq!(eval("[1].concat([2, 3], 4).length"), Value::Number(4.0));
    }

    #[test]
    fn test_sort() {
        assert_eq!(eval("[10, 9, 1].sort().join()"), Value::from("1,10,9"));
        assert_eq!(eval("[10, 9, 1].sort((a, b) => a - b).join()"), Value::from("1,9,10"));
        assert_eq!(
            eval("[{ n: 'b', k: 1 }, { n: 'a', k: 1 }, { n: 'c', k: 0 }].sort((x, y) => x.k - y.k).map(o => o.n).join('')"),
            Value::from("cba")
        );
    }

    #[test]
    fn test_to_string_and_join_holes() {
        assert_eq!(eval("String([1, [2, 3], null, undefined])"), Value::from("1,2,3,,"));
    }

    #[test]
    fn test_array_constructor_and_statics() {
        assert_eq!(eval("new Array(3).length"), Value::Number(3.0));
        assert_eq!(eval("Array.of(7).length"), Value::Number(1.0));
        assert_eq!(eval("Array.isArray([]) && !Array.isArray({})"), Value::Boolean(true));
        assert_eq!(eval("Array.from('abc', c => c.toUpperCase()).join('')"), Value::from("ABC"));
        assert_eq!(eval("[1, [2, [3]]].flat().length"), Value::Number(3.0));
    }

    #[test]
    fn test_oversized_arrays_throw_range_error() {
        for source in [
            "Array(1e10)",
            "new Array(2 ** 32 - 1)",
            "Array.from({ length: 1e12 })",
        ] {
            let err = Engine::new().eval(source).unwrap_err();
            let exception = err.exception().unwrap();
            assert_eq!(exception.name(), "RangeError", "{}", source);
            assert_eq!(exception.message(), "Invalid array length", "{}", source);
        }
        assert_eq!(eval("Array(1000).length"), Value::Number(1000.0));
        assert_eq!(eval("Array.from({ length: 2, 0: 'a' }).join('|')"), Value::from("a|"));
    }

    #[test]
    fn test_callbacks_see_live_length() {
        assert_eq!(
            eval("const s = [1, 2, 3]; let seen = 0; s.forEach(() => { seen++; s.pop(); }); seen * 10 + s.length"),
            Value::Number(21.0)
        );
        assert_eq!(
            eval("const s = [1, 2, 3]; s.forEach(x => s.push(x)); s.join()"),
            Value::from("1,2,3,1,2,3")
        );
        assert_eq!(
            eval("const s = [1, 2, 3, 4]; const m = s.map(x => { s.pop(); return x * 2; }); m.length + ':' + m.join()"),
            Value::from("4:2,4,,")
        );
        assert_eq!(
            eval("const s = [1, 2, 3, 4]; s.filter(x => { s.length = 2; return true; }).join()"),
            Value::from("1,2")
        );
        assert_eq!(
            eval("const s = [1, 2, 3]; s.reduce((a, x) => { s.pop(); return a + x; }, 0)"),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_callback_errors_propagate() {
        let err = Engine::new()
            .eval("[1].forEach(() => { throw new RangeError('stop'); })")
            .unwrap_err();
        assert_eq!(err.to_string(), "RangeError: stop");
    }

    #[test]
    fn test_frozen_array_push_throws() {
        let err = Engine::new().eval("Object.freeze([1]).push(2)").unwrap_err();
        assert_eq!(err.exception().unwrap().name(), "TypeError");
    }
}
