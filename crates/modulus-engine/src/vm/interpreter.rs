// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Statement execution and expression evaluation.
//!
//! Scopes are [`Environment`] chains. A few internal bindings carry call
//! state that nested arrow functions must see through the chain:
//!
//! - `this` - the receiver; uninitialized in a derived constructor until
//!   `super(...)` returns
//! - `%home` - the object whose prototype `super.name` reads from
//! - `%ctor`, `%newtarget` - the running constructor and the constructor
//!   `new` was applied to

use super::operators::{self, Hint};
use crate::ast::*;
use crate::builtins::error::ErrorKind;
use crate::runtime::context::DepthGuard;
use crate::runtime::{
    AssignError, Closure, ClosureKind, Environment, Function, Lookup, ObjectKind, ObjectRef,
    Value, array_index,
};
use crate::{Engine, Throw};
use std::rc::Rc;

/// Outcome of executing a statement.
pub(crate) enum Completion {
    /// Ran to the end; carries the value of the last expression statement
    Normal(Option<Value>),
    /// `return`
    Return(Value),
    /// `break`
    Break,
    /// `continue`
    Continue,
}

/// A member or call expression evaluated as a link of an optional chain.
enum Chain {
    /// A `?.` saw a nullish object; the whole chain yields undefined
    ShortCircuit,
    /// The value and the object it was read from (the call receiver)
    Value { this: Value, value: Value },
}

/// How a binding pattern stores its values.
#[derive(Debug, Clone, Copy)]
enum BindMode {
    /// Create a fresh binding in the target scope
    Declare { mutable: bool },
    /// Initialize a hoisted `let`/`const`/`class` binding
    Initialize,
    /// Assign through the scope chain (`var`, plain assignment targets)
    Assign,
}

const THIS_BEFORE_SUPER: &str = "Must call super constructor in derived class before accessing 'this' or returning from derived constructor";

impl Engine {
    /// Runs a statement list in `env` and returns its completion value.
    pub(crate) fn run_program(&self, body: &[Statement], env: &Environment) -> Result<Value, Throw> {
        hoist_vars(body, env);
        self.hoist_lexical(body, env);
        match self.run_statements(body, env)? {
            Completion::Normal(value) => Ok(value.unwrap_or_default()),
            Completion::Return(value) => Ok(value),
            Completion::Break | Completion::Continue => Ok(Value::Undefined),
        }
    }

    /// Calls a function value with an explicit receiver.
    pub(crate) fn call_function(
        &self,
        callee: &Value,
        this: Value,
        arguments: &[Value],
    ) -> Result<Value, Throw> {
        let Some((object, function)) = callee
            .as_object()
            .and_then(|object| Some((object, object.function()?)))
        else {
            return Err(self.throw(
                ErrorKind::TypeError,
                format!("{} is not a function", describe_value(callee)),
            ));
        };

        let _frame = self.enter_frame()?;
        match &*function {
            Function::Native(native) => (native.call)(self, &this, arguments),
            Function::Script(closure) => {
                if function.is_class_constructor() {
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        format!(
                            "Class constructor {} cannot be invoked without 'new'",
                            object.function_name()
                        ),
                    ));
                }
                let (returned, _) = self.invoke_closure(closure, object, Some(this), arguments, None)?;
                Ok(returned.unwrap_or_default())
            }
        }
    }

    /// Applies `new` to `callee`; the instance prototype comes from
    /// `new_target.prototype`.
    pub(crate) fn construct_with(
        &self,
        callee: &Value,
        arguments: &[Value],
        new_target: &Value,
    ) -> Result<Value, Throw> {
        let Some((object, function)) = callee
            .as_object()
            .and_then(|object| Some((object, object.function()?)))
            .filter(|(_, function)| function.is_constructor())
        else {
            return Err(self.throw(
                ErrorKind::TypeError,
                format!("{} is not a constructor", describe_value(callee)),
            ));
        };

        let _frame = self.enter_frame()?;
        match &*function {
            Function::Native(native) => {
                let this = Value::Object(self.allocate_instance(new_target));
                let result = (native.call)(self, &this, arguments)?;
                Ok(if matches!(result, Value::Object(_)) { result } else { this })
            }
            Function::Script(closure) if closure.kind == ClosureKind::DerivedConstructor => {
                let (returned, env) =
                    self.invoke_closure(closure, object, None, arguments, Some(new_target))?;
                match returned {
                    Some(result @ Value::Object(_)) => Ok(result),
                    _ => self.this_value(&env),
                }
            }
            Function::Script(closure) => {
                let this = Value::Object(self.allocate_instance(new_target));
                let (returned, _) =
                    self.invoke_closure(closure, object, Some(this.clone()), arguments, Some(new_target))?;
                Ok(match returned {
                    Some(result @ Value::Object(_)) => result,
                    _ => this,
                })
            }
        }
    }

    /// Reads `target[key]`; primitives read from their prototype.
    pub(crate) fn get_property(&self, target: &Value, key: &str) -> Result<Value, Throw> {
        let intrinsics = &self.context.intrinsics;
        match target {
            Value::Object(object) => Ok(object.get(key)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::from(s.chars().count()));
                }
                if let Some(index) = array_index(key) {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::from(c.to_string()))
                        .unwrap_or_default());
                }
                Ok(intrinsics.string_prototype.get(key))
            }
            Value::Number(_) => Ok(intrinsics.number_prototype.get(key)),
            Value::Boolean(_) => Ok(intrinsics.boolean_prototype.get(key)),
            Value::Undefined | Value::Null => Err(self.throw(
                ErrorKind::TypeError,
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    target.to_display_string(),
                    key
                ),
            )),
        }
    }

    /// Writes `target[key] = value`. Writes to frozen objects and to
    /// primitives are ignored.
    pub(crate) fn set_property(&self, target: &Value, key: &str, value: Value) -> Result<(), Throw> {
        match target {
            Value::Object(object) => {
                object.set(key, value);
                Ok(())
            }
            Value::Undefined | Value::Null => Err(self.throw(
                ErrorKind::TypeError,
                format!(
                    "Cannot set properties of {} (setting '{}')",
                    target.to_display_string(),
                    key
                ),
            )),
            _ => Ok(()),
        }
    }

    /// ToString, calling `toString`/`valueOf` on objects.
    pub(crate) fn to_string_value(&self, value: &Value) -> Result<Rc<str>, Throw> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Object(_) => {
                let primitive = operators::to_primitive(self, value, Hint::String)?;
                Ok(primitive.to_display_string().into())
            }
            other => Ok(other.to_display_string().into()),
        }
    }

    fn enter_frame(&self) -> Result<DepthGuard<'_>, Throw> {
        self.context.enter().ok_or_else(|| {
            self.throw(ErrorKind::RangeError, "Maximum call stack size exceeded")
        })
    }

    fn allocate_instance(&self, new_target: &Value) -> ObjectRef {
        let prototype = match new_target {
            Value::Object(target) => match target.get("prototype") {
                Value::Object(prototype) => prototype,
                _ => self.context.intrinsics.object_prototype.clone(),
            },
            _ => self.context.intrinsics.object_prototype.clone(),
        };
        ObjectRef::new(ObjectKind::Ordinary, Some(prototype))
    }

    /// Runs a script function body. Returns the explicit return value (or
    /// the arrow expression value) and the function scope.
    fn invoke_closure(
        &self,
        closure: &Closure,
        function: &ObjectRef,
        this: Option<Value>,
        arguments: &[Value],
        new_target: Option<&Value>,
    ) -> Result<(Option<Value>, Environment), Throw> {
        let env = closure.env.child();

        if closure.kind != ClosureKind::Arrow {
            match this {
                Some(this) => env.define("this", this, false),
                None => env.declare("this".into(), false),
            }
            env.define(
                "arguments",
                Value::Object(self.new_array(arguments.to_vec())),
                true,
            );
            if let Some(home) = &closure.home {
                env.define("%home", Value::Object(home.clone()), false);
            }
            if matches!(
                closure.kind,
                ClosureKind::BaseConstructor | ClosureKind::DerivedConstructor
            ) {
                env.define("%ctor", Value::Object(function.clone()), false);
                env.define("%newtarget", new_target.cloned().unwrap_or_default(), false);
            }
        }

        for (i, param) in closure.node.params.iter().enumerate() {
            let value = if param.rest {
                Value::Object(self.new_array(arguments.get(i..).unwrap_or(&[]).to_vec()))
            } else {
                arguments.get(i).cloned().unwrap_or_default()
            };
            self.bind_element(&param.element, value, &env, BindMode::Declare { mutable: true })?;
        }

        let returned = match &closure.node.body {
            FunctionBody::Expression(expression) => Some(self.evaluate(expression, &env)?),
            FunctionBody::Block(body) => {
                hoist_vars(body, &env);
                self.hoist_lexical(body, &env);
                match self.run_statements(body, &env)? {
                    Completion::Return(value) => Some(value),
                    _ => None,
                }
            }
        };
        Ok((returned, env))
    }

    // ---- statements ----

    /// Declares the `let`/`const`/`class`/`function` names of a statement
    /// list in `env`. Functions are created up front.
    fn hoist_lexical(&self, body: &[Statement], env: &Environment) {
        for statement in body {
            match statement {
                Statement::VariableDeclaration(declaration) => declare_lexical(declaration, env),
                Statement::ClassDeclaration(node) => {
                    if let Some(id) = &node.id {
                        env.declare(id.name.clone(), true);
                    }
                }
                Statement::FunctionDeclaration(node) => {
                    if let Some(id) = &node.id {
                        let function =
                            self.make_closure(node.clone(), env.clone(), ClosureKind::Normal, None);
                        env.define(id.name.clone(), Value::Object(function), true);
                    }
                }
                _ => {}
            }
        }
    }

    fn run_statements(&self, body: &[Statement], env: &Environment) -> Result<Completion, Throw> {
        let mut last = None;
        for statement in body {
            match self.execute(statement, env)? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_block(&self, body: &[Statement], env: &Environment) -> Result<Completion, Throw> {
        let scope = env.child();
        self.hoist_lexical(body, &scope);
        self.run_statements(body, &scope)
    }

    fn execute(&self, statement: &Statement, env: &Environment) -> Result<Completion, Throw> {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                self.declare_variables(declaration, env)?;
                Ok(Completion::Normal(None))
            }
            Statement::FunctionDeclaration(_) | Statement::Empty => Ok(Completion::Normal(None)),
            Statement::ClassDeclaration(node) => {
                let class = self.evaluate_class(node, env, None)?;
                if let Some(id) = &node.id {
                    self.bind_name(&id.name, class, env, BindMode::Initialize)?;
                }
                Ok(Completion::Normal(None))
            }
            Statement::Expression(expression) => {
                Ok(Completion::Normal(Some(self.evaluate(expression, env)?)))
            }
            Statement::Block(body) => self.execute_block(body, env),
            Statement::If(statement) => {
                if self.evaluate(&statement.test, env)?.to_boolean() {
                    self.execute(&statement.consequent, env)
                } else if let Some(alternate) = &statement.alternate {
                    self.execute(alternate, env)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Statement::Switch(statement) => self.execute_switch(statement, env),
            Statement::While(statement) => {
                let mut last = None;
                while self.evaluate(&statement.test, env)?.to_boolean() {
                    if let Some(done) = self.run_iteration(&statement.body, env, &mut last)? {
                        return Ok(done);
                    }
                }
                Ok(Completion::Normal(last))
            }
            Statement::DoWhile(statement) => {
                let mut last = None;
                loop {
                    if let Some(done) = self.run_iteration(&statement.body, env, &mut last)? {
                        return Ok(done);
                    }
                    if !self.evaluate(&statement.test, env)?.to_boolean() {
                        break;
                    }
                }
                Ok(Completion::Normal(last))
            }
            Statement::For(statement) => self.execute_for(statement, env),
            Statement::ForIn(statement) => self.execute_for_in(statement, env),
            Statement::ForOf(statement) => self.execute_for_of(statement, env),
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expression) => self.evaluate(expression, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
            Statement::Throw(expression) => Err(Throw(self.evaluate(expression, env)?)),
            Statement::Try(statement) => self.execute_try(statement, env),
        }
    }

    fn declare_variables(
        &self,
        declaration: &VariableDeclaration,
        env: &Environment,
    ) -> Result<(), Throw> {
        let mode = match declaration.kind {
            VariableKind::Var => BindMode::Assign,
            VariableKind::Let | VariableKind::Const => BindMode::Initialize,
        };
        for declarator in &declaration.declarations {
            let value = match &declarator.init {
                Some(init) => self.evaluate_named(init, env, pattern_name(&declarator.id))?,
                None if declaration.kind == VariableKind::Var => continue,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.id, value, env, mode)?;
        }
        Ok(())
    }

    /// Runs one loop iteration. Returns the completion that ends the loop,
    /// if any.
    fn run_iteration(
        &self,
        body: &Statement,
        env: &Environment,
        last: &mut Option<Value>,
    ) -> Result<Option<Completion>, Throw> {
        match self.execute(body, env)? {
            Completion::Normal(value) => {
                if value.is_some() {
                    *last = value;
                }
                Ok(None)
            }
            Completion::Continue => Ok(None),
            Completion::Break => Ok(Some(Completion::Normal(last.take()))),
            Completion::Return(value) => Ok(Some(Completion::Return(value))),
        }
    }

    fn execute_switch(&self, statement: &SwitchStatement, env: &Environment) -> Result<Completion, Throw> {
        let discriminant = self.evaluate(&statement.discriminant, env)?;
        let scope = env.child();
        for case in &statement.cases {
            self.hoist_lexical(&case.consequent, &scope);
        }

        let mut start = None;
        for (i, case) in statement.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.evaluate(test, &scope)?.strict_equals(&discriminant) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| statement.cases.iter().position(|case| case.test.is_none()))
        else {
            return Ok(Completion::Normal(None));
        };

        let mut last = None;
        for case in &statement.cases[start..] {
            match self.run_statements(&case.consequent, &scope)? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                Completion::Break => return Ok(Completion::Normal(last)),
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_for(&self, statement: &ForStatement, env: &Environment) -> Result<Completion, Throw> {
        let mut scope = env.child();
        let mut per_iteration: Vec<Rc<str>> = Vec::new();

        match &statement.init {
            Some(ForInit::Declaration(declaration)) => {
                declare_lexical(declaration, &scope);
                if declaration.kind == VariableKind::Let {
                    for declarator in &declaration.declarations {
                        declarator.id.bound_names(&mut per_iteration);
                    }
                }
                self.declare_variables(declaration, &scope)?;
            }
            Some(ForInit::Expression(expression)) => {
                self.evaluate(expression, &scope)?;
            }
            None => {}
        }

        let mut last = None;
        loop {
            if let Some(test) = &statement.test {
                if !self.evaluate(test, &scope)?.to_boolean() {
                    break;
                }
            }
            if let Some(done) = self.run_iteration(&statement.body, &scope, &mut last)? {
                return Ok(done);
            }
            // Each iteration gets its own copy of the `let` bindings
            if !per_iteration.is_empty() {
                let next = env.child();
                scope.copy_into(&per_iteration, &next);
                scope = next;
            }
            if let Some(update) = &statement.update {
                self.evaluate(update, &scope)?;
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_for_in(&self, statement: &ForEachStatement, env: &Environment) -> Result<Completion, Throw> {
        let object = self.evaluate(&statement.right, env)?;
        let keys: Vec<Rc<str>> = match &object {
            Value::Object(object) => object.enumerable_keys(),
            Value::String(s) => (0..s.chars().count()).map(|i| Rc::from(i.to_string())).collect(),
            _ => Vec::new(),
        };
        self.run_for_each(statement, env, keys.into_iter().map(Value::String))
    }

    fn execute_for_of(&self, statement: &ForEachStatement, env: &Environment) -> Result<Completion, Throw> {
        let iterable = self.evaluate(&statement.right, env)?;
        match &iterable {
            // Arrays are read live so elements pushed by the body are visited
            Value::Object(array) if array.is_array() => {
                let array = array.clone();
                let mut index = 0;
                let elements = std::iter::from_fn(move || {
                    if index >= array.array_len()? {
                        return None;
                    }
                    let element = array.get_own(&index.to_string()).unwrap_or_default();
                    index += 1;
                    Some(element)
                });
                self.run_for_each(statement, env, elements)
            }
            _ => {
                let values = self.collect_iterable(&iterable, || describe(&statement.right))?;
                self.run_for_each(statement, env, values.into_iter())
            }
        }
    }

    fn run_for_each(
        &self,
        statement: &ForEachStatement,
        env: &Environment,
        values: impl Iterator<Item = Value>,
    ) -> Result<Completion, Throw> {
        let mut last = None;
        for value in values {
            let scope = env.child();
            match &statement.left {
                ForEachTarget::Declaration(VariableKind::Var, pattern) => {
                    self.bind_pattern(pattern, value, &scope, BindMode::Assign)?
                }
                ForEachTarget::Declaration(kind, pattern) => self.bind_pattern(
                    pattern,
                    value,
                    &scope,
                    BindMode::Declare {
                        mutable: *kind == VariableKind::Let,
                    },
                )?,
                ForEachTarget::Expression(target) => self.assign_to(target, value, &scope)?,
            }
            if let Some(done) = self.run_iteration(&statement.body, &scope, &mut last)? {
                return Ok(done);
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_try(&self, statement: &TryStatement, env: &Environment) -> Result<Completion, Throw> {
        let outcome = match self.execute_block(&statement.block, env) {
            Err(thrown) => match &statement.handler {
                Some(handler) => self.execute_catch(handler, thrown, env),
                None => Err(thrown),
            },
            completed => completed,
        };

        let Some(finalizer) = &statement.finalizer else {
            return outcome;
        };
        match self.execute_block(finalizer, env)? {
            Completion::Normal(_) => outcome,
            abrupt => Ok(abrupt),
        }
    }

    fn execute_catch(
        &self,
        handler: &CatchClause,
        thrown: Throw,
        env: &Environment,
    ) -> Result<Completion, Throw> {
        let scope = env.child();
        if let Some(param) = &handler.param {
            self.bind_pattern(param, thrown.0, &scope, BindMode::Declare { mutable: true })?;
        }
        self.execute_block(&handler.body, &scope)
    }

    // ---- expressions ----

    fn evaluate(&self, expression: &Expression, env: &Environment) -> Result<Value, Throw> {
        match expression {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),
            Expression::Template(parts) => self.evaluate_template(parts, env),
            Expression::Identifier(id) => self.lookup(&id.name, env),
            Expression::This => self.this_value(env),
            Expression::Array(elements) => {
                let elements = self.evaluate_elements(elements, env)?;
                Ok(Value::Object(self.new_array(elements)))
            }
            Expression::Object(properties) => self.evaluate_object(properties, env),
            Expression::Function(node) => Ok(Value::Object(self.evaluate_function(node, env))),
            Expression::Class(node) => self.evaluate_class(node, env, None),
            Expression::Unary(unary) => self.evaluate_unary(unary, env),
            Expression::Update(update) => self.evaluate_update(update, env),
            Expression::Binary(binary) => {
                let left = self.evaluate(&binary.left, env)?;
                let right = self.evaluate(&binary.right, env)?;
                operators::binary(self, binary.operator, &left, &right)
            }
            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left, env)?;
                let settled = match logical.operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                    LogicalOperator::Nullish => !left.is_nullish(),
                };
                if settled {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right, env)
                }
            }
            Expression::Assignment(assignment) => self.evaluate_assignment(assignment, env),
            Expression::Conditional(conditional) => {
                if self.evaluate(&conditional.test, env)?.to_boolean() {
                    self.evaluate(&conditional.consequent, env)
                } else {
                    self.evaluate(&conditional.alternate, env)
                }
            }
            Expression::Call(_) | Expression::Member(_) => match self.evaluate_chain(expression, env)? {
                Chain::ShortCircuit => Ok(Value::Undefined),
                Chain::Value { value, .. } => Ok(value),
            },
            Expression::New(call) => {
                let callee = self.evaluate(&call.callee, env)?;
                let arguments = self.evaluate_elements(&call.arguments, env)?;
                if !is_constructor(&callee) {
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        format!("{} is not a constructor", describe(&call.callee)),
                    ));
                }
                self.construct_with(&callee, &arguments, &callee)
            }
            Expression::SuperCall(arguments) => self.evaluate_super_call(arguments, env),
            Expression::SuperMember(name) => self.super_property(name, env),
            Expression::Sequence(expressions) => {
                let mut last = Value::Undefined;
                for expression in expressions {
                    last = self.evaluate(expression, env)?;
                }
                Ok(last)
            }
        }
    }

    /// Evaluates an initializer, giving anonymous functions and classes
    /// the name they are bound to.
    fn evaluate_named(
        &self,
        expression: &Expression,
        env: &Environment,
        name: Option<&Rc<str>>,
    ) -> Result<Value, Throw> {
        let Some(name) = name else {
            return self.evaluate(expression, env);
        };
        match expression {
            Expression::Function(node) if node.id.is_none() => {
                let function = self.evaluate_function(node, env);
                function.define_hidden("name", Value::String(name.clone()));
                Ok(Value::Object(function))
            }
            Expression::Class(node) if node.id.is_none() => {
                self.evaluate_class(node, env, Some(name.clone()))
            }
            _ => self.evaluate(expression, env),
        }
    }

    fn lookup(&self, name: &str, env: &Environment) -> Result<Value, Throw> {
        match env.lookup(name) {
            Lookup::Found(value) => Ok(value),
            Lookup::Uninitialized => Err(self.throw(
                ErrorKind::ReferenceError,
                format!("Cannot access '{}' before initialization", name),
            )),
            Lookup::Missing => Err(self.throw(
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            )),
        }
    }

    fn this_value(&self, env: &Environment) -> Result<Value, Throw> {
        match env.lookup("this") {
            Lookup::Found(value) => Ok(value),
            Lookup::Uninitialized => Err(self.throw(ErrorKind::ReferenceError, THIS_BEFORE_SUPER)),
            Lookup::Missing => Ok(Value::Undefined),
        }
    }

    fn assign_identifier(&self, name: &str, value: Value, env: &Environment) -> Result<(), Throw> {
        env.assign(name, value).map_err(|error| match error {
            AssignError::Constant => {
                self.throw(ErrorKind::TypeError, "Assignment to constant variable.")
            }
            AssignError::Uninitialized => self.throw(
                ErrorKind::ReferenceError,
                format!("Cannot access '{}' before initialization", name),
            ),
            AssignError::Missing => self.throw(
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            ),
        })
    }

    fn evaluate_template(&self, parts: &[TemplatePart], env: &Environment) -> Result<Value, Throw> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expression(expression) => {
                    let value = self.evaluate(expression, env)?;
                    out.push_str(&self.to_string_value(&value)?);
                }
            }
        }
        Ok(Value::from(out))
    }

    /// Evaluates array literal elements or call arguments, expanding spreads.
    fn evaluate_elements(&self, elements: &[ArrayElement], env: &Environment) -> Result<Vec<Value>, Throw> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                ArrayElement::Expression(expression) => values.push(self.evaluate(expression, env)?),
                ArrayElement::Spread(expression) => {
                    let iterable = self.evaluate(expression, env)?;
                    values.extend(self.collect_iterable(&iterable, || describe(expression))?);
                }
                ArrayElement::Hole => values.push(Value::Undefined),
            }
        }
        Ok(values)
    }

    /// The values produced by iterating an array or a string.
    fn collect_iterable(
        &self,
        value: &Value,
        description: impl FnOnce() -> String,
    ) -> Result<Vec<Value>, Throw> {
        if let Some(elements) = value.as_object().and_then(ObjectRef::array_elements) {
            return Ok(elements);
        }
        if let Value::String(s) = value {
            return Ok(s.chars().map(|c| Value::from(c.to_string())).collect());
        }
        Err(self.throw(
            ErrorKind::TypeError,
            format!("{} is not iterable", description()),
        ))
    }

    fn evaluate_object(&self, properties: &[ObjectProperty], env: &Environment) -> Result<Value, Throw> {
        let object = self.new_object();
        for property in properties {
            match property {
                ObjectProperty::Property { key, value } => {
                    let key = self.property_key(key, env)?;
                    let value = self.evaluate_named(value, env, Some(&key))?;
                    object.set(&key, value);
                }
                ObjectProperty::Spread(source) => match self.evaluate(source, env)? {
                    Value::Object(source) => {
                        for key in source.keys() {
                            object.set(&key, source.get(&key));
                        }
                    }
                    Value::String(s) => {
                        for (i, c) in s.chars().enumerate() {
                            object.set(&i.to_string(), c.to_string());
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(Value::Object(object))
    }

    fn property_key(&self, key: &PropertyKey, env: &Environment) -> Result<Rc<str>, Throw> {
        match key {
            PropertyKey::Static(name) => Ok(name.clone()),
            PropertyKey::Computed(expression) => {
                let value = self.evaluate(expression, env)?;
                self.to_string_value(&value)
            }
        }
    }

    fn member_key(&self, property: &MemberProperty, env: &Environment) -> Result<Rc<str>, Throw> {
        match property {
            MemberProperty::Identifier(name) => Ok(name.clone()),
            MemberProperty::Computed(expression) => {
                let value = self.evaluate(expression, env)?;
                self.to_string_value(&value)
            }
        }
    }

    fn evaluate_function(&self, node: &Rc<FunctionNode>, env: &Environment) -> ObjectRef {
        if node.is_arrow {
            return self.make_closure(node.clone(), env.clone(), ClosureKind::Arrow, None);
        }
        match &node.id {
            // A named function expression can refer to itself
            Some(id) => {
                let scope = env.child();
                let function = self.make_closure(node.clone(), scope.clone(), ClosureKind::Normal, None);
                scope.define(id.name.clone(), Value::Object(function.clone()), false);
                function
            }
            None => self.make_closure(node.clone(), env.clone(), ClosureKind::Normal, None),
        }
    }

    fn evaluate_class(
        &self,
        node: &Rc<ClassNode>,
        env: &Environment,
        inferred_name: Option<Rc<str>>,
    ) -> Result<Value, Throw> {
        let intrinsics = &self.context.intrinsics;
        let name: Rc<str> = node
            .id
            .as_ref()
            .map(|id| id.name.clone())
            .or(inferred_name)
            .unwrap_or_else(|| "".into());

        let scope = env.child();
        if let Some(id) = &node.id {
            scope.declare(id.name.clone(), false);
        }

        let (prototype_parent, constructor_parent) = match &node.superclass {
            None => (
                Some(intrinsics.object_prototype.clone()),
                intrinsics.function_prototype.clone(),
            ),
            Some(expression) => match self.evaluate(expression, &scope)? {
                Value::Null => (None, intrinsics.function_prototype.clone()),
                Value::Object(parent) if parent.function().is_some_and(|f| f.is_constructor()) => {
                    match parent.get("prototype") {
                        Value::Object(prototype) => (Some(prototype), parent),
                        Value::Null => (None, parent),
                        other => {
                            return Err(self.throw(
                                ErrorKind::TypeError,
                                format!(
                                    "Class extends value does not have valid prototype property {}",
                                    describe_value(&other)
                                ),
                            ));
                        }
                    }
                }
                other => {
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        format!(
                            "Class extends value {} is not a constructor or null",
                            describe_value(&other)
                        ),
                    ));
                }
            },
        };

        let derived = node.superclass.is_some();
        let prototype = ObjectRef::new(ObjectKind::Ordinary, prototype_parent);
        let constructor_node = node
            .constructor
            .clone()
            .unwrap_or_else(|| default_constructor(derived));
        let kind = if derived {
            ClosureKind::DerivedConstructor
        } else {
            ClosureKind::BaseConstructor
        };

        let constructor =
            self.make_closure(constructor_node, scope.clone(), kind, Some(prototype.clone()));
        constructor.define_hidden("name", Value::String(name));
        constructor.set_prototype(Some(constructor_parent));
        constructor.define_hidden("prototype", prototype.clone());
        prototype.define_hidden("constructor", constructor.clone());

        for method in &node.methods {
            let home = if method.is_static {
                constructor.clone()
            } else {
                prototype.clone()
            };
            let function = self.make_closure(
                method.function.clone(),
                scope.clone(),
                ClosureKind::Method,
                Some(home.clone()),
            );
            function.define_hidden("name", Value::String(method.key.clone()));
            home.define_hidden(&method.key, function);
        }

        if let Some(id) = &node.id {
            scope.initialize(&id.name, Value::Object(constructor.clone()));
        }
        Ok(Value::Object(constructor))
    }

    fn super_property(&self, name: &str, env: &Environment) -> Result<Value, Throw> {
        let Lookup::Found(Value::Object(home)) = env.lookup("%home") else {
            return Err(self.throw(ErrorKind::SyntaxError, "'super' keyword unexpected here"));
        };
        Ok(home.prototype().map(|p| p.get(name)).unwrap_or_default())
    }

    fn evaluate_super_call(&self, arguments: &[ArrayElement], env: &Environment) -> Result<Value, Throw> {
        let Lookup::Found(Value::Object(constructor)) = env.lookup("%ctor") else {
            return Err(self.throw(ErrorKind::SyntaxError, "'super' keyword unexpected here"));
        };
        let new_target = match env.lookup("%newtarget") {
            Lookup::Found(value) => value,
            _ => Value::Undefined,
        };
        let arguments = self.evaluate_elements(arguments, env)?;

        let parent = constructor.prototype().map(Value::Object).unwrap_or_default();
        if !is_constructor(&parent) {
            return Err(self.throw(
                ErrorKind::TypeError,
                format!(
                    "Super constructor {} of anonymous class is not a constructor",
                    describe_value(&parent)
                ),
            ));
        }

        let this = self.construct_with(&parent, &arguments, &new_target)?;
        env.initialize_nearest("this", this.clone()).map_err(|_| {
            self.throw(
                ErrorKind::ReferenceError,
                "Super constructor may only be called once",
            )
        })?;
        Ok(this)
    }

    /// Evaluates a member or call expression, stopping at a `?.` whose
    /// object is nullish.
    fn evaluate_chain(&self, expression: &Expression, env: &Environment) -> Result<Chain, Throw> {
        match expression {
            Expression::Member(member) => {
                let object = match self.evaluate_chain(&member.object, env)? {
                    Chain::ShortCircuit => return Ok(Chain::ShortCircuit),
                    Chain::Value { value, .. } => value,
                };
                if member.optional && object.is_nullish() {
                    return Ok(Chain::ShortCircuit);
                }
                let key = self.member_key(&member.property, env)?;
                let value = self.get_property(&object, &key)?;
                Ok(Chain::Value {
                    this: object,
                    value,
                })
            }
            Expression::Call(call) => {
                let (this, callee) = match &*call.callee {
                    Expression::SuperMember(name) => {
                        (self.this_value(env)?, self.super_property(name, env)?)
                    }
                    callee => match self.evaluate_chain(callee, env)? {
                        Chain::ShortCircuit => return Ok(Chain::ShortCircuit),
                        Chain::Value { this, value } => (this, value),
                    },
                };
                let arguments = self.evaluate_elements(&call.arguments, env)?;
                if !callee.is_callable() {
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        format!("{} is not a function", describe(&call.callee)),
                    ));
                }
                let value = self.call_function(&callee, this, &arguments)?;
                Ok(Chain::Value {
                    this: Value::Undefined,
                    value,
                })
            }
            other => Ok(Chain::Value {
                this: Value::Undefined,
                value: self.evaluate(other, env)?,
            }),
        }
    }

    fn evaluate_unary(&self, unary: &UnaryExpression, env: &Environment) -> Result<Value, Throw> {
        match unary.operator {
            UnaryOperator::Typeof => {
                // Undeclared names are not an error here
                if let Expression::Identifier(id) = &*unary.argument {
                    if let Lookup::Missing = env.lookup(&id.name) {
                        return Ok(Value::from("undefined"));
                    }
                }
                let value = self.evaluate(&unary.argument, env)?;
                Ok(Value::from(value.type_of()))
            }
            UnaryOperator::Delete => self.evaluate_delete(&unary.argument, env),
            operator => {
                let value = self.evaluate(&unary.argument, env)?;
                Ok(match operator {
                    UnaryOperator::Minus => Value::Number(-operators::to_number(self, &value)?),
                    UnaryOperator::Plus => Value::Number(operators::to_number(self, &value)?),
                    UnaryOperator::LogicalNot => Value::Boolean(!value.to_boolean()),
                    UnaryOperator::BitwiseNot => {
                        Value::Number(!operators::to_int32(operators::to_number(self, &value)?) as f64)
                    }
                    _ => Value::Undefined,
                })
            }
        }
    }

    fn evaluate_delete(&self, argument: &Expression, env: &Environment) -> Result<Value, Throw> {
        match argument {
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, env)?;
                if member.optional && object.is_nullish() {
                    return Ok(Value::Boolean(true));
                }
                let key = self.member_key(&member.property, env)?;
                match &object {
                    Value::Object(target) => Ok(Value::Boolean(target.delete(&key))),
                    Value::Undefined | Value::Null => Err(self.throw(
                        ErrorKind::TypeError,
                        "Cannot convert undefined or null to object",
                    )),
                    _ => Ok(Value::Boolean(true)),
                }
            }
            Expression::Identifier(_) => Ok(Value::Boolean(false)),
            other => {
                self.evaluate(other, env)?;
                Ok(Value::Boolean(true))
            }
        }
    }

    fn evaluate_update(&self, update: &UpdateExpression, env: &Environment) -> Result<Value, Throw> {
        let delta = match update.operator {
            UpdateOperator::Increment => 1.0,
            UpdateOperator::Decrement => -1.0,
        };
        let (old, new) = match &*update.argument {
            Expression::Identifier(id) => {
                let current = self.lookup(&id.name, env)?;
                let old = operators::to_number(self, &current)?;
                self.assign_identifier(&id.name, Value::Number(old + delta), env)?;
                (old, old + delta)
            }
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, env)?;
                let key = self.member_key(&member.property, env)?;
                let current = self.get_property(&object, &key)?;
                let old = operators::to_number(self, &current)?;
                self.set_property(&object, &key, Value::Number(old + delta))?;
                (old, old + delta)
            }
            _ => {
                return Err(self.throw(
                    ErrorKind::SyntaxError,
                    "Invalid left-hand side expression in update operation",
                ));
            }
        };
        Ok(Value::Number(if update.prefix { new } else { old }))
    }

    fn evaluate_assignment(
        &self,
        assignment: &AssignmentExpression,
        env: &Environment,
    ) -> Result<Value, Throw> {
        match &*assignment.left {
            Expression::Identifier(id) => {
                let value = match assignment.operator.binary() {
                    None => self.evaluate_named(&assignment.right, env, Some(&id.name))?,
                    Some(operator) => {
                        let current = self.lookup(&id.name, env)?;
                        let right = self.evaluate(&assignment.right, env)?;
                        operators::binary(self, operator, &current, &right)?
                    }
                };
                self.assign_identifier(&id.name, value.clone(), env)?;
                Ok(value)
            }
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, env)?;
                let key = self.member_key(&member.property, env)?;
                let value = match assignment.operator.binary() {
                    None => self.evaluate(&assignment.right, env)?,
                    Some(operator) => {
                        let current = self.get_property(&object, &key)?;
                        let right = self.evaluate(&assignment.right, env)?;
                        operators::binary(self, operator, &current, &right)?
                    }
                };
                self.set_property(&object, &key, value.clone())?;
                Ok(value)
            }
            _ => Err(self.throw(
                ErrorKind::SyntaxError,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    /// Stores into an identifier or member target (for-in/of heads).
    fn assign_to(&self, target: &Expression, value: Value, env: &Environment) -> Result<(), Throw> {
        match target {
            Expression::Identifier(id) => self.assign_identifier(&id.name, value, env),
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, env)?;
                let key = self.member_key(&member.property, env)?;
                self.set_property(&object, &key, value)
            }
            _ => Err(self.throw(
                ErrorKind::SyntaxError,
                "Invalid left-hand side in for-loop",
            )),
        }
    }

    // ---- patterns ----

    fn bind_pattern(
        &self,
        pattern: &Pattern,
        value: Value,
        env: &Environment,
        mode: BindMode,
    ) -> Result<(), Throw> {
        match pattern {
            Pattern::Identifier(id) => self.bind_name(&id.name, value, env, mode),
            Pattern::Object(properties) => {
                if value.is_nullish() {
                    let shown = value.to_display_string();
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        format!("Cannot destructure '{}' as it is {}.", shown, shown),
                    ));
                }
                for property in properties {
                    let member = self.get_property(&value, &property.key)?;
                    self.bind_element(&property.value, member, env, mode)?;
                }
                Ok(())
            }
            Pattern::Array(elements) => {
                let items = self.collect_iterable(&value, || describe_value(&value))?;
                for (i, element) in elements.iter().enumerate() {
                    if let Some(element) = element {
                        let item = items.get(i).cloned().unwrap_or_default();
                        self.bind_element(element, item, env, mode)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn bind_element(
        &self,
        element: &PatternElement,
        value: Value,
        env: &Environment,
        mode: BindMode,
    ) -> Result<(), Throw> {
        let value = match &element.default {
            Some(default) if value.is_undefined() => {
                self.evaluate_named(default, env, pattern_name(&element.target))?
            }
            _ => value,
        };
        self.bind_pattern(&element.target, value, env, mode)
    }

    fn bind_name(
        &self,
        name: &Rc<str>,
        value: Value,
        env: &Environment,
        mode: BindMode,
    ) -> Result<(), Throw> {
        match mode {
            BindMode::Declare { mutable } => {
                env.define(name.clone(), value, mutable);
                Ok(())
            }
            BindMode::Initialize => {
                if env.has_own(name) {
                    env.initialize(name, value);
                } else {
                    env.define(name.clone(), value, true);
                }
                Ok(())
            }
            BindMode::Assign => self.assign_identifier(name, value, env),
        }
    }
}

/// Declares every `var` in `body` (nested blocks included, nested
/// functions excluded).
fn hoist_vars(body: &[Statement], env: &Environment) {
    for statement in body {
        hoist_var(statement, env);
    }
}

fn hoist_var(statement: &Statement, env: &Environment) {
    match statement {
        Statement::VariableDeclaration(declaration) if declaration.kind == VariableKind::Var => {
            for declarator in &declaration.declarations {
                declare_var_names(&declarator.id, env);
            }
        }
        Statement::Block(body) => hoist_vars(body, env),
        Statement::If(statement) => {
            hoist_var(&statement.consequent, env);
            if let Some(alternate) = &statement.alternate {
                hoist_var(alternate, env);
            }
        }
        Statement::While(statement) | Statement::DoWhile(statement) => hoist_var(&statement.body, env),
        Statement::For(statement) => {
            if let Some(ForInit::Declaration(declaration)) = &statement.init {
                if declaration.kind == VariableKind::Var {
                    for declarator in &declaration.declarations {
                        declare_var_names(&declarator.id, env);
                    }
                }
            }
            hoist_var(&statement.body, env);
        }
        Statement::ForIn(statement) | Statement::ForOf(statement) => {
            if let ForEachTarget::Declaration(VariableKind::Var, pattern) = &statement.left {
                declare_var_names(pattern, env);
            }
            hoist_var(&statement.body, env);
        }
        Statement::Switch(statement) => {
            for case in &statement.cases {
                hoist_vars(&case.consequent, env);
            }
        }
        Statement::Try(statement) => {
            hoist_vars(&statement.block, env);
            if let Some(handler) = &statement.handler {
                hoist_vars(&handler.body, env);
            }
            if let Some(finalizer) = &statement.finalizer {
                hoist_vars(finalizer, env);
            }
        }
        _ => {}
    }
}

fn declare_var_names(pattern: &Pattern, env: &Environment) {
    let mut names = Vec::new();
    pattern.bound_names(&mut names);
    for name in names {
        env.declare_var(name);
    }
}

/// Declares the names of a `let`/`const` declaration as uninitialized.
fn declare_lexical(declaration: &VariableDeclaration, env: &Environment) {
    if declaration.kind == VariableKind::Var {
        return;
    }
    let mut names = Vec::new();
    for declarator in &declaration.declarations {
        declarator.id.bound_names(&mut names);
    }
    for name in names {
        env.declare(name, declaration.kind == VariableKind::Let);
    }
}

fn pattern_name(pattern: &Pattern) -> Option<&Rc<str>> {
    match pattern {
        Pattern::Identifier(id) => Some(&id.name),
        _ => None,
    }
}

fn is_constructor(value: &Value) -> bool {
    value
        .as_object()
        .and_then(ObjectRef::function)
        .is_some_and(|function| function.is_constructor())
}

/// `constructor() {}` or, for derived classes,
/// `constructor(...args) { super(...args); }`.
fn default_constructor(derived: bool) -> Rc<FunctionNode> {
    let args = Identifier::new("args");
    let (params, body) = if derived {
        (
            vec![Param {
                element: PatternElement {
                    target: Pattern::Identifier(args.clone()),
                    default: None,
                },
                rest: true,
            }],
            vec![Statement::Expression(Expression::SuperCall(vec![
                ArrayElement::Spread(Expression::Identifier(args)),
            ]))],
        )
    } else {
        (Vec::new(), Vec::new())
    };
    Rc::new(FunctionNode {
        id: None,
        params,
        body: FunctionBody::Block(body),
        is_arrow: false,
    })
}

/// Source-like description of an expression for error messages.
fn describe(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Identifier(name) => format!("{}.{}", describe(&member.object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe(&member.object)),
        },
        Expression::SuperMember(name) => format!("(intermediate value).{}", name),
        Expression::Call(call) => format!("{}(...)", describe(&call.callee)),
        _ => "(intermediate value)".to_string(),
    }
}

/// Short description of a value for error messages.
fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Object(object) if object.is_callable() => {
            let name = object.function_name();
            if name.is_empty() {
                "function".to_string()
            } else {
                name
            }
        }
        Value::Object(object) if object.is_array() => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        other => other.to_display_string(),
    }
}
