// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modulus-engine
//!
//! An embedded interpreter for the subset of JavaScript used by CommonJS
//! module code.
//!
//! ## Overview
//!
//! This crate provides:
//! - A lexer and recursive descent parser
//! - A tree-walking interpreter with lexical scoping, closures, classes and
//!   exceptions
//! - The builtins module code commonly relies on (`console`, `Object`,
//!   `Array`, `JSON`, `Math`, error constructors, ...)
//! - A host API for compiling functions, calling them and exchanging values
//!
//! ## Quick Start
//!
//! ```rust
//! use modulus_engine::{Engine, Value};
//!
//! let engine = Engine::new();
//! let result = engine.eval("1 + 2").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
mod vm;

pub use builtins::console::{CapturedConsole, Console, LogLevel, StdConsole};
pub use builtins::error::ErrorKind;
pub use error::{Error, Exception, Throw};
pub use runtime::{Environment, ObjectRef, Value};

use ast::{FunctionBody, FunctionNode, Identifier, Param, Pattern, PatternElement};
use parser::Parser;
use runtime::{Closure, ClosureKind, Context, Function, NativeFunction, ObjectKind};
use std::rc::Rc;

/// Tunables for a new engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Nested calls allowed before `RangeError: Maximum call stack size
    /// exceeded` is thrown
    pub max_call_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_call_depth: runtime::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// The main engine instance.
///
/// Cloning an engine is cheap and yields a handle to the same global scope.
#[derive(Clone)]
pub struct Engine {
    context: Rc<Context>,
}

impl Engine {
    /// Creates an engine that prints console output to stdout/stderr.
    pub fn new() -> Self {
        Self::with_options(Rc::new(StdConsole), EngineOptions::default())
    }

    /// Creates an engine with a custom console sink.
    pub fn with_console(console: Rc<dyn Console>) -> Self {
        Self::with_options(console, EngineOptions::default())
    }

    /// Creates an engine with the given call depth limit.
    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self::with_options(Rc::new(StdConsole), EngineOptions { max_call_depth })
    }

    /// Creates an engine with a console sink and options.
    pub fn with_options(console: Rc<dyn Console>, options: EngineOptions) -> Self {
        let engine = Self {
            context: Rc::new(Context::new(console, options.max_call_depth)),
        };
        builtins::install(&engine);
        engine
    }

    /// The shared execution context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The console sink used by `console.*`.
    pub fn console(&self) -> Rc<dyn Console> {
        self.context.console.clone()
    }

    /// Evaluates source code in the global scope and returns the completion
    /// value of the last statement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use modulus_engine::{Engine, Value};
    /// let engine = Engine::new();
    /// engine.eval("const double = (x) => x * 2;").unwrap();
    /// assert_eq!(engine.eval("double(21)").unwrap(), Value::Number(42.0));
    /// ```
    pub fn eval(&self, source: &str) -> Result<Value, Error> {
        let global = self.context.global.clone();
        self.eval_in(source, &global)
    }

    /// Evaluates source code in the given scope.
    pub fn eval_in(&self, source: &str, scope: &Environment) -> Result<Value, Error> {
        let program = Parser::new(source).parse_program()?;
        Ok(self.run_program(&program.body, scope)?)
    }

    /// Creates a scope below the global one holding `bindings` and `this`.
    pub fn create_scope(&self, bindings: &[(&str, Value)], this: Value) -> Environment {
        let scope = self.context.global.child();
        scope.define("this", this, false);
        for (name, value) in bindings {
            scope.define(*name, value.clone(), true);
        }
        scope
    }

    /// Evaluates source code with extra bindings visible to it.
    pub fn eval_with_bindings(
        &self,
        source: &str,
        bindings: &[(&str, Value)],
        this: Value,
    ) -> Result<Value, Error> {
        let scope = self.create_scope(bindings, this);
        self.eval_in(source, &scope)
    }

    /// Compiles `body` as the body of a function with the given parameters.
    ///
    /// The function closes over the global scope only, so code inside it
    /// sees nothing but its parameters and the globals.
    pub fn compile_function(&self, name: &str, params: &[&str], body: &str) -> Result<Value, Error> {
        let program = Parser::new(body).parse_program()?;
        let node = FunctionNode {
            id: Some(Identifier::new(name)),
            params: params
                .iter()
                .map(|param| Param {
                    element: PatternElement {
                        target: Pattern::Identifier(Identifier::new(param)),
                        default: None,
                    },
                    rest: false,
                })
                .collect(),
            body: FunctionBody::Block(program.body),
            is_arrow: false,
        };

        let function = self.make_closure(
            Rc::new(node),
            self.context.global.clone(),
            ClosureKind::Normal,
            None,
        );
        Ok(Value::Object(function))
    }

    /// Calls a function value.
    pub fn call(&self, callee: &Value, this: Value, args: &[Value]) -> Result<Value, Throw> {
        self.call_function(callee, this, args)
    }

    /// Calls the method `name` of `object`.
    pub fn call_method(&self, object: &Value, name: &str, args: &[Value]) -> Result<Value, Throw> {
        let method = self.get(object, name)?;
        if !method.is_callable() {
            return Err(self.throw(
                ErrorKind::TypeError,
                format!("{} is not a function", name),
            ));
        }
        self.call(&method, object.clone(), args)
    }

    /// Applies `new` to a constructor.
    pub fn construct(&self, callee: &Value, args: &[Value]) -> Result<Value, Throw> {
        self.construct_with(callee, args, callee)
    }

    /// Creates a function object backed by a Rust closure.
    pub fn native_function<F>(&self, name: &str, arity: usize, f: F) -> ObjectRef
    where
        F: Fn(&Engine, &Value, &[Value]) -> Result<Value, Throw> + 'static,
    {
        self.make_native(name, arity, Rc::new(f), false)
    }

    pub(crate) fn make_native(
        &self,
        name: &str,
        arity: usize,
        call: Rc<runtime::NativeFn>,
        constructor: bool,
    ) -> ObjectRef {
        let function = ObjectRef::new(
            ObjectKind::Function(Rc::new(Function::Native(NativeFunction {
                name: name.into(),
                call,
                constructor,
            }))),
            Some(self.context.intrinsics.function_prototype.clone()),
        );
        function.define_hidden("name", name);
        function.define_hidden("length", arity);
        function
    }

    pub(crate) fn make_closure(
        &self,
        node: Rc<FunctionNode>,
        env: Environment,
        kind: ClosureKind,
        home: Option<ObjectRef>,
    ) -> ObjectRef {
        let name = node.id.as_ref().map(|id| id.name.clone());
        let function = Function::Script(Closure {
            node,
            env,
            kind,
            home,
        });
        let arity = function.arity();
        let object = ObjectRef::new(
            ObjectKind::Function(Rc::new(function)),
            Some(self.context.intrinsics.function_prototype.clone()),
        );
        object.define_hidden("name", Value::String(name.unwrap_or_else(|| "".into())));
        object.define_hidden("length", arity);

        if kind == ClosureKind::Normal {
            let prototype = self.new_object();
            prototype.define_hidden("constructor", object.clone());
            object.define_hidden("prototype", prototype);
        }
        object
    }

    /// Creates an empty plain object.
    pub fn new_object(&self) -> ObjectRef {
        ObjectRef::new(
            ObjectKind::Ordinary,
            Some(self.context.intrinsics.object_prototype.clone()),
        )
    }

    /// Creates an array.
    pub fn new_array(&self, elements: Vec<Value>) -> ObjectRef {
        ObjectRef::new(
            ObjectKind::Array(elements),
            Some(self.context.intrinsics.array_prototype.clone()),
        )
    }

    /// Creates an error object of the given kind.
    pub fn new_error(&self, kind: ErrorKind, message: impl Into<String>) -> ObjectRef {
        builtins::error::create(self, kind, &message.into())
    }

    /// Creates an error object and wraps it for throwing.
    pub fn throw(&self, kind: ErrorKind, message: impl Into<String>) -> Throw {
        Throw(Value::Object(self.new_error(kind, message)))
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        match self.context.global.lookup(name) {
            runtime::Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Defines or replaces a global binding.
    pub fn set_global(&self, name: &str, value: Value) {
        self.context.global.define(name, value, true);
    }

    /// Reads a property of any value, boxing primitives as needed.
    pub fn get(&self, target: &Value, key: &str) -> Result<Value, Throw> {
        self.get_property(target, key)
    }

    /// Writes a property of an object value.
    pub fn set(&self, target: &Value, key: &str, value: Value) -> Result<(), Throw> {
        self.set_property(target, key, value)
    }

    /// Converts a value to a string, calling `toString` on objects.
    pub fn to_string(&self, value: &Value) -> Result<Rc<str>, Throw> {
        self.to_string_value(value)
    }

    /// Formats a value the way `console.log` does.
    pub fn inspect(&self, value: &Value) -> String {
        builtins::console::inspect(value)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_expression() {
        let engine = Engine::new();
        assert_eq!(engine.eval("2 + 2").unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_globals_persist_between_evals() {
        let engine = Engine::new();
        engine.eval("let counter = 1;").unwrap();
        engine.eval("counter += 1;").unwrap();
        assert_eq!(engine.global("counter"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_compile_function_sees_only_params() {
        let engine = Engine::new();
        let scope = engine.create_scope(&[("secret", Value::from(1.0))], Value::Undefined);
        engine.eval_in("secret", &scope).unwrap();

        let function = engine
            .compile_function("wrapper", &["a", "b"], "return typeof secret + ':' + (a + b);")
            .unwrap();
        let result = engine
            .call(&function, Value::Undefined, &[Value::from(1.0), Value::from(2.0)])
            .unwrap();
        assert_eq!(result, Value::from("undefined:3"));
    }

    #[test]
    fn test_native_function() {
        let engine = Engine::new();
        let add = engine.native_function("add", 2, |_, _, args| {
            let sum: f64 = args.iter().map(Value::to_number).sum();
            Ok(Value::Number(sum))
        });
        engine.set_global("nativeAdd", Value::Object(add));
        assert_eq!(engine.eval("nativeAdd(1, 2, 3)").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_syntax_error() {
        let engine = Engine::new();
        let err = engine.eval("let = ;").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_uncaught_exception() {
        let engine = Engine::new();
        let err = engine.eval("throw new TypeError('bad input')").unwrap_err();
        let exception = err.exception().unwrap();
        assert_eq!(exception.name(), "TypeError");
        assert_eq!(exception.message(), "bad input");
        assert_eq!(err.to_string(), "TypeError: bad input");
    }

    #[test]
    fn test_construct_and_call_method() {
        let engine = Engine::new();
        let class = engine
            .eval("(class Counter { constructor(n) { this.n = n; } inc() { return ++this.n; } })")
            .unwrap();
        let instance = engine.construct(&class, &[Value::from(41.0)]).unwrap();
        let result = engine.call_method(&instance, "inc", &[]).unwrap();
        assert_eq!(result, Value::Number(42.0));
    }
}
