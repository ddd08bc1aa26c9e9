// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error constructors: `Error`, `TypeError`, `RangeError`,
//! `ReferenceError` and `SyntaxError`.

use super::{arg, method};
use crate::runtime::{ObjectKind, ObjectRef, Value};
use crate::{Engine, Throw};
use std::fmt;
use std::rc::Rc;

/// The builtin error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error
    Error,
    /// TypeError
    TypeError,
    /// RangeError
    RangeError,
    /// ReferenceError
    ReferenceError,
    /// SyntaxError
    SyntaxError,
}

impl ErrorKind {
    /// All kinds, base first.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
    ];

    /// The constructor name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn register(engine: &Engine) {
    let intrinsics = &engine.context().intrinsics;
    let mut base_constructor: Option<ObjectRef> = None;

    for kind in ErrorKind::ALL {
        let prototype = intrinsics.error_prototype_for(kind);
        prototype.define_hidden("name", kind.as_str());
        prototype.define_hidden("message", "");

        let constructor = engine.make_native(
            kind.as_str(),
            1,
            Rc::new(move |engine: &Engine, this: &Value, args: &[Value]| {
                construct_error(engine, kind, this, args)
            }),
            true,
        );
        constructor.define_hidden("prototype", prototype.clone());
        prototype.define_hidden("constructor", constructor.clone());

        match &base_constructor {
            Some(base) => constructor.set_prototype(Some(base.clone())),
            None => base_constructor = Some(constructor.clone()),
        }

        engine.set_global(kind.as_str(), Value::Object(constructor));
    }

    method(engine, &intrinsics.error_prototype, "toString", 0, error_to_string);
}

/// Creates an error object with the given message.
pub(crate) fn create(engine: &Engine, kind: ErrorKind, message: &str) -> ObjectRef {
    let prototype = engine.context().intrinsics.error_prototype_for(kind).clone();
    let error = ObjectRef::new(ObjectKind::Error, Some(prototype));
    error.define_hidden("message", message);
    error.define_hidden("stack", stack_text(kind.as_str(), message));
    error
}

fn stack_text(name: &str, message: &str) -> String {
    if message.is_empty() {
        format!("{}\n    at <anonymous>", name)
    } else {
        format!("{}: {}\n    at <anonymous>", name, message)
    }
}

fn inherits_from(object: &ObjectRef, prototype: &ObjectRef) -> bool {
    let mut current = object.prototype();
    while let Some(candidate) = current {
        if candidate.ptr_eq(prototype) {
            return true;
        }
        current = candidate.prototype();
    }
    false
}

/// Shared body of the error constructors.
///
/// Under `new` (including `super(...)` from a subclass) the receiver is the
/// freshly allocated instance; a plain call allocates one.
fn construct_error(engine: &Engine, kind: ErrorKind, this: &Value, args: &[Value]) -> Result<Value, Throw> {
    let prototype = engine.context().intrinsics.error_prototype_for(kind).clone();
    let error = match this {
        Value::Object(object) if !object.is_callable() && inherits_from(object, &prototype) => {
            object.clone()
        }
        _ => ObjectRef::new(ObjectKind::Ordinary, Some(prototype)),
    };
    error.set_kind(ObjectKind::Error);

    let message = match arg(args, 0) {
        Value::Undefined => None,
        value => Some(engine.to_string(&value)?),
    };
    if let Some(message) = &message {
        error.define_hidden("message", Value::String(message.clone()));
    }

    if let Value::Object(options) = arg(args, 1) {
        if options.has_property("cause") {
            error.define_hidden("cause", options.get("cause"));
        }
    }

    let name = error.get("name").to_display_string();
    error.define_hidden(
        "stack",
        stack_text(&name, message.as_deref().unwrap_or("")),
    );

    Ok(Value::Object(error))
}

/// Error.prototype.toString()
pub fn error_to_string(engine: &Engine, this: &Value, _args: &[Value]) -> Result<Value, Throw> {
    let Value::Object(object) = this else {
        return Err(engine.throw(
            ErrorKind::TypeError,
            "Error.prototype.toString called on non-object",
        ));
    };
    let name = match object.get("name") {
        Value::Undefined => Rc::from("Error"),
        value => engine.to_string(&value)?,
    };
    let message = match object.get("message") {
        Value::Undefined => Rc::from(""),
        value => engine.to_string(&value)?,
    };

    Ok(Value::from(match (name.is_empty(), message.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => message.to_string(),
        (false, false) => format!("{}: {}", name, message),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hierarchy() {
        let engine = Engine::new();
        let result = engine
            .eval(
                "const e = new TypeError('bad');\n\
                 [e instanceof TypeError, e instanceof Error, e.name, e.message, String(e)].join('|')",
            )
            .unwrap();
        assert_eq!(result, Value::from("true|true|TypeError|bad|TypeError: bad"));
    }

    #[test]
    fn test_error_without_new() {
        let engine = Engine::new();
        let result = engine.eval("const e = RangeError('x'); e instanceof RangeError && e.message === 'x'");
        assert_eq!(result.unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_error_subclass() {
        let engine = Engine::new();
        let result = engine
            .eval(
                "class ValidationError extends Error {\n\
                   constructor(field) { super('invalid ' + field); this.name = 'ValidationError'; this.field = field; }\n\
                 }\n\
                 const e = new ValidationError('email');\n\
                 [e instanceof ValidationError, e instanceof Error, e.message, e.field, e.toString()].join('|')",
            )
            .unwrap();
        assert_eq!(
            result,
            Value::from("true|true|invalid email|email|ValidationError: invalid email")
        );
    }

    #[test]
    fn test_host_created_error() {
        let engine = Engine::new();
        let error = engine.new_error(ErrorKind::ReferenceError, "x is not defined");
        assert!(error.is_error());
        assert_eq!(error.get("name"), Value::from("ReferenceError"));
        assert!(error.get("stack").to_display_string().starts_with("ReferenceError: x is not defined"));
    }

    #[test]
    fn test_error_cause() {
        let engine = Engine::new();
        let result = engine
            .eval("new Error('outer', { cause: 'inner' }).cause")
            .unwrap();
        assert_eq!(result, Value::from("inner"));
    }
}
