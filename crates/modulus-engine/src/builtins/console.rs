// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Console built-in object.
//!
//! Provides `console.log`, `console.error`, `console.warn`, etc. Output is
//! routed through a [`Console`] sink so hosts can redirect or capture it.

use super::{arg, method};
use crate::runtime::{ObjectClass, ObjectRef, Value, number_to_string};
use crate::{Engine, Throw};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::io::Write as _;

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// console.log
    Log,
    /// console.info
    Info,
    /// console.warn
    Warn,
    /// console.error
    Error,
    /// console.debug
    Debug,
}

/// Destination for script console output.
pub trait Console {
    /// Writes one formatted line.
    fn write(&self, level: LogLevel, message: &str);
}

/// Writes `log`/`info`/`debug` to stdout and `warn`/`error` to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Warn | LogLevel::Error => {
                let _ = writeln!(std::io::stderr(), "{}", message);
            }
            LogLevel::Log | LogLevel::Info | LogLevel::Debug => {
                let _ = writeln!(std::io::stdout(), "{}", message);
            }
        }
    }
}

/// Records console output in memory.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    lines: RefCell<Vec<(LogLevel, String)>>,
}

impl CapturedConsole {
    /// Every line written so far.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.borrow().clone()
    }

    /// Messages written at any level, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Forgets captured output.
    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Console for CapturedConsole {
    fn write(&self, level: LogLevel, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}

pub(crate) fn register(engine: &Engine) {
    let console = engine.new_object();
    method(engine, &console, "log", 0, console_log);
    method(engine, &console, "info", 0, console_info);
    method(engine, &console, "warn", 0, console_warn);
    method(engine, &console, "error", 0, console_error);
    method(engine, &console, "debug", 0, console_debug);
    engine.set_global("console", Value::Object(console));
}

fn emit(engine: &Engine, level: LogLevel, args: &[Value]) -> Result<Value, Throw> {
    engine.console().write(level, &format_message(args));
    Ok(Value::Undefined)
}

/// console.log
pub fn console_log(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    emit(engine, LogLevel::Log, args)
}

/// console.info
pub fn console_info(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    emit(engine, LogLevel::Info, args)
}

/// console.warn
pub fn console_warn(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    emit(engine, LogLevel::Warn, args)
}

/// console.error
pub fn console_error(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    emit(engine, LogLevel::Error, args)
}

/// console.debug
pub fn console_debug(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, Throw> {
    emit(engine, LogLevel::Debug, args)
}

/// Joins console arguments, applying `%s`/`%d`/`%i`/`%f`/`%o`/`%O`/`%j`
/// substitutions when the first argument is a string.
pub fn format_message(args: &[Value]) -> String {
    let mut out = String::new();
    let mut rest = 0;

    if let Some(Value::String(template)) = args.first() {
        rest = 1;
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                Some(spec @ ('s' | 'd' | 'i' | 'f' | 'o' | 'O' | 'j')) if rest < args.len() => {
                    chars.next();
                    let value = arg(args, rest);
                    rest += 1;
                    match spec {
                        's' => match &value {
                            Value::String(s) => out.push_str(s),
                            other => out.push_str(&inspect(other)),
                        },
                        'd' | 'i' => {
                            let n = value.to_number();
                            let n = if spec == 'i' { n.trunc() } else { n };
                            out.push_str(&number_to_string(n));
                        }
                        'f' => out.push_str(&number_to_string(value.to_number())),
                        'j' => match value.to_json() {
                            Ok(Some(json)) => out.push_str(&json.to_string()),
                            Ok(None) => out.push_str("undefined"),
                            Err(_) => out.push_str("[Circular]"),
                        },
                        _ => out.push_str(&inspect(&value)),
                    }
                }
                _ => out.push('%'),
            }
        }
    }

    for value in &args[rest.min(args.len())..] {
        if !out.is_empty() || rest > 0 {
            out.push(' ');
        }
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&inspect(other)),
        }
    }

    out
}

/// Maximum nesting shown before objects collapse to `[Object]`.
const INSPECT_DEPTH: usize = 2;
/// Single-line output longer than this is broken across lines.
const LINE_WIDTH: usize = 72;

/// Formats a value for display (`console.log`, REPL results).
pub fn inspect(value: &Value) -> String {
    let mut seen = Vec::new();
    inspect_value(value, 0, &mut seen, 0)
}

fn inspect_value(value: &Value, depth: usize, seen: &mut Vec<ObjectRef>, indent: usize) -> String {
    match value {
        Value::String(s) if depth > 0 => quote(s),
        Value::Number(n) if *n == 0.0 && n.is_sign_negative() => "-0".to_string(),
        Value::Object(object) => inspect_object(object, depth, seen, indent),
        other => other.to_display_string(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if valid { key.to_string() } else { quote(key) }
}

fn inspect_object(object: &ObjectRef, depth: usize, seen: &mut Vec<ObjectRef>, indent: usize) -> String {
    if seen.iter().any(|s| s.ptr_eq(object)) {
        return "[Circular]".to_string();
    }

    match object.class() {
        ObjectClass::Function => {
            let name = object.function_name();
            let is_class = object
                .function()
                .is_some_and(|function| function.is_class_constructor());
            let label = match (is_class, name.is_empty()) {
                (true, true) => "[class (anonymous)]".to_string(),
                (true, false) => format!("[class {}]", name),
                (false, true) => "[Function (anonymous)]".to_string(),
                (false, false) => format!("[Function: {}]", name),
            };
            return with_properties(label, object, depth, seen, indent);
        }
        ObjectClass::Error => {
            let text = Value::Object(object.clone()).to_display_string();
            return if depth > 0 { format!("[{}]", text) } else { text };
        }
        _ => {}
    }

    let is_array = object.is_array();
    if depth > INSPECT_DEPTH {
        return if is_array { "[Array]" } else { "[Object]" }.to_string();
    }

    seen.push(object.clone());
    let mut entries = Vec::new();
    if let Some(elements) = object.array_elements() {
        for element in &elements {
            entries.push(inspect_value(element, depth + 1, seen, indent + 2));
        }
    }
    for key in object.keys() {
        if is_array && crate::runtime::array_index(&key).is_some() {
            continue;
        }
        let value = object.get_own(&key).unwrap_or_default();
        entries.push(format!(
            "{}: {}",
            format_key(&key),
            inspect_value(&value, depth + 1, seen, indent + 2)
        ));
    }
    seen.pop();

    let prefix = if is_array {
        String::new()
    } else {
        constructor_prefix(object)
    };
    let (open, close) = if is_array { ("[", "]") } else { ("{", "}") };
    wrap(&prefix, open, close, &entries, indent)
}

/// `Calculator ` for class instances; empty for plain objects.
fn constructor_prefix(object: &ObjectRef) -> String {
    let Some(prototype) = object.prototype() else {
        return "[Object: null prototype] ".to_string();
    };
    match prototype.get_own("constructor") {
        Some(Value::Object(constructor)) => {
            let name = constructor.function_name();
            if name.is_empty() || name == "Object" {
                String::new()
            } else {
                format!("{} ", name)
            }
        }
        _ => String::new(),
    }
}

fn with_properties(
    label: String,
    object: &ObjectRef,
    depth: usize,
    seen: &mut Vec<ObjectRef>,
    indent: usize,
) -> String {
    let keys = object.keys();
    if keys.is_empty() || depth > INSPECT_DEPTH {
        return label;
    }
    seen.push(object.clone());
    let entries: Vec<String> = keys
        .iter()
        .map(|key| {
            let value = object.get_own(key).unwrap_or_default();
            format!("{}: {}", format_key(key), inspect_value(&value, depth + 1, seen, indent + 2))
        })
        .collect();
    seen.pop();
    wrap(&format!("{} ", label), "{", "}", &entries, indent)
}

fn wrap(prefix: &str, open: &str, close: &str, entries: &[String], indent: usize) -> String {
    if entries.is_empty() {
        return format!("{}{}{}", prefix, open, close);
    }

    let single = format!("{}{} {} {}", prefix, open, entries.join(", "), close);
    if single.len() + indent <= LINE_WIDTH && !single.contains('\n') {
        return single;
    }

    let pad = " ".repeat(indent + 2);
    let mut out = format!("{}{}\n", prefix, open);
    for (i, entry) in entries.iter().enumerate() {
        let _ = write!(out, "{}{}", pad, entry);
        out.push_str(if i + 1 < entries.len() { ",\n" } else { "\n" });
    }
    let _ = write!(out, "{}{}", " ".repeat(indent), close);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn engine_with_capture() -> (Engine, Rc<CapturedConsole>) {
        let console = Rc::new(CapturedConsole::default());
        (Engine::with_console(console.clone()), console)
    }

    #[test]
    fn test_console_levels() {
        let (engine, console) = engine_with_capture();
        engine
            .eval("console.log('a', 1); console.warn('careful'); console.error('bad')")
            .unwrap();
        assert_eq!(
            console.lines(),
            vec![
                (LogLevel::Log, "a 1".to_string()),
                (LogLevel::Warn, "careful".to_string()),
                (LogLevel::Error, "bad".to_string()),
            ]
        );
    }

    #[test]
    fn test_format_specifiers() {
        let (engine, console) = engine_with_capture();
        engine
            .eval("console.log('%s has %d items (%i%%)', 'cart', 3, 42.9, 'extra')")
            .unwrap();
        assert_eq!(console.messages(), vec!["cart has 3 items (42%) extra"]);
    }

    #[test]
    fn test_inspect_nested() {
        let engine = Engine::new();
        let value = engine
            .eval("({ name: 'math', list: [1, 'two', null], nested: { a: { b: { c: 1 } } } })")
            .unwrap();
        assert_eq!(
            inspect(&value),
            "{\n  name: 'math',\n  list: [ 1, 'two', null ],\n  nested: { a: { b: [Object] } }\n}"
        );
    }

    #[test]
    fn test_inspect_short_values() {
        let engine = Engine::new();
        let value = engine.eval("({ a: 1, 'b-c': undefined, f() {} })").unwrap();
        assert_eq!(inspect(&value), "{ a: 1, 'b-c': undefined, f: [Function: f] }");
        assert_eq!(inspect(&engine.eval("[]").unwrap()), "[]");
        assert_eq!(inspect(&engine.eval("-0").unwrap()), "-0");
    }

    #[test]
    fn test_inspect_class_instance_and_circular() {
        let engine = Engine::new();
        let value = engine
            .eval("class Calculator { constructor() { this.history = []; } }\nnew Calculator()")
            .unwrap();
        assert_eq!(inspect(&value), "Calculator { history: [] }");

        let cycle = engine.eval("const o = { x: 1 }; o.self = o; o").unwrap();
        assert_eq!(inspect(&cycle), "{ x: 1, self: [Circular] }");
    }

    #[test]
    fn test_inspect_functions_and_errors() {
        let engine = Engine::new();
        assert_eq!(inspect(&engine.eval("(class Calculator {})").unwrap()), "[class Calculator]");
        assert_eq!(inspect(&engine.eval("(() => 1)").unwrap()), "[Function (anonymous)]");
        assert_eq!(
            inspect(&engine.eval("new RangeError('too big')").unwrap()),
            "RangeError: too big"
        );
    }
}
