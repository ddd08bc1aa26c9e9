// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Function representation.

use super::environment::Environment;
use super::object::ObjectRef;
use super::value::Value;
use crate::ast::FunctionNode;
use crate::{Engine, Throw};
use std::fmt;
use std::rc::Rc;

/// Signature of a host-provided function: engine, `this`, arguments.
pub type NativeFn = dyn Fn(&Engine, &Value, &[Value]) -> Result<Value, Throw>;

/// How a script function binds `this` and whether it can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureKind {
    /// `function` declarations and expressions
    Normal,
    /// Arrow functions (lexical `this`, not constructible)
    Arrow,
    /// Object literal and class methods (not constructible)
    Method,
    /// Constructor of a class without `extends`
    BaseConstructor,
    /// Constructor of a class with `extends`
    DerivedConstructor,
}

/// A function defined in script code together with its captured scope.
pub struct Closure {
    pub(crate) node: Rc<FunctionNode>,
    pub(crate) env: Environment,
    pub(crate) kind: ClosureKind,
    /// Object whose prototype `super.x` reads from
    pub(crate) home: Option<ObjectRef>,
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub(crate) name: Rc<str>,
    pub(crate) call: Rc<NativeFn>,
    pub(crate) constructor: bool,
}

/// A callable value.
pub enum Function {
    /// Defined in script code
    Script(Closure),
    /// Implemented in Rust
    Native(NativeFunction),
}

impl Function {
    /// The name given at definition.
    pub fn name(&self) -> &str {
        match self {
            Function::Script(closure) => closure
                .node
                .id
                .as_ref()
                .map(|id| &*id.name)
                .unwrap_or(""),
            Function::Native(native) => &native.name,
        }
    }

    /// Returns true if `new` may be applied to this function.
    pub fn is_constructor(&self) -> bool {
        match self {
            Function::Script(closure) => matches!(
                closure.kind,
                ClosureKind::Normal | ClosureKind::BaseConstructor | ClosureKind::DerivedConstructor
            ),
            Function::Native(native) => native.constructor,
        }
    }

    /// Returns true for class constructors, which cannot be called without
    /// `new`.
    pub fn is_class_constructor(&self) -> bool {
        matches!(
            self,
            Function::Script(Closure {
                kind: ClosureKind::BaseConstructor | ClosureKind::DerivedConstructor,
                ..
            })
        )
    }

    /// Number of declared parameters before the first default or rest.
    pub fn arity(&self) -> usize {
        match self {
            Function::Script(closure) => closure
                .node
                .params
                .iter()
                .take_while(|p| !p.rest && p.element.default.is_none())
                .count(),
            Function::Native(_) => 0,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Script(closure) => write!(f, "Closure({}, {:?})", self.name(), closure.kind),
            Function::Native(native) => write!(f, "Native({})", native.name),
        }
    }
}
