// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments for variable binding.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A variable binding.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
    initialized: bool,
}

#[derive(Default)]
struct Scope {
    bindings: FxHashMap<Rc<str>, Binding>,
    outer: Option<Environment>,
}

/// Result of resolving a name.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Bound and initialized
    Found(Value),
    /// Declared with `let`/`const`/`class` but not yet initialized
    Uninitialized,
    /// Not declared in any enclosing scope
    Missing,
}

/// Why an assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// Target is a `const` binding
    Constant,
    /// Target is still in its temporal dead zone
    Uninitialized,
    /// Target is not declared
    Missing,
}

/// A lexical environment: a scope with a link to its enclosing scope.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// Creates a new top-level environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a nested environment.
    pub fn child(&self) -> Environment {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            outer: Some(self.clone()),
        })))
    }

    fn outer(&self) -> Option<Environment> {
        self.0.borrow().outer.clone()
    }

    /// Declares an uninitialized binding in this scope.
    pub fn declare(&self, name: Rc<str>, mutable: bool) {
        self.0.borrow_mut().bindings.insert(
            name,
            Binding {
                value: Value::Undefined,
                mutable,
                initialized: false,
            },
        );
    }

    /// Declares and initializes a binding in this scope.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value, mutable: bool) {
        self.0.borrow_mut().bindings.insert(
            name.into(),
            Binding {
                value,
                mutable,
                initialized: true,
            },
        );
    }

    /// Declares a `var` binding unless one already exists in this scope.
    pub fn declare_var(&self, name: Rc<str>) {
        self.0
            .borrow_mut()
            .bindings
            .entry(name)
            .or_insert(Binding {
                value: Value::Undefined,
                mutable: true,
                initialized: true,
            });
    }

    /// Initializes a binding declared in this scope.
    pub fn initialize(&self, name: &str, value: Value) -> bool {
        match self.0.borrow_mut().bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                binding.initialized = true;
                true
            }
            None => false,
        }
    }

    /// Initializes the nearest binding of `name` that is still uninitialized.
    ///
    /// Fails with `Constant` if the nearest binding is already initialized.
    pub fn initialize_nearest(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if binding.initialized {
                        return Err(AssignError::Constant);
                    }
                    binding.value = value;
                    binding.initialized = true;
                    return Ok(());
                }
            }
            current = current.outer().ok_or(AssignError::Missing)?;
        }
    }

    /// Resolves a name through the scope chain.
    pub fn lookup(&self, name: &str) -> Lookup {
        let mut current = self.clone();
        loop {
            if let Some(binding) = current.0.borrow().bindings.get(name) {
                return if binding.initialized {
                    Lookup::Found(binding.value.clone())
                } else {
                    Lookup::Uninitialized
                };
            }
            match current.outer() {
                Some(outer) => current = outer,
                None => return Lookup::Missing,
            }
        }
    }

    /// Assigns to the nearest binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if !binding.initialized {
                        return Err(AssignError::Uninitialized);
                    }
                    if !binding.mutable {
                        return Err(AssignError::Constant);
                    }
                    binding.value = value;
                    return Ok(());
                }
            }
            current = current.outer().ok_or(AssignError::Missing)?;
        }
    }

    /// Returns true if `name` is declared in this scope itself.
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Copies the current values of `names` into `target` as fresh mutable
    /// bindings (per-iteration loop scopes).
    pub fn copy_into(&self, names: &[Rc<str>], target: &Environment) {
        let scope = self.0.borrow();
        for name in names {
            if let Some(binding) = scope.bindings.get(name) {
                target.0.borrow_mut().bindings.insert(name.clone(), binding.clone());
            }
        }
    }

    /// Every name visible from this scope, innermost first, without
    /// duplicates. Internal bindings starting with `%` are skipped.
    pub fn visible_names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let mut own: Vec<Rc<str>> = env
                .0
                .borrow()
                .bindings
                .keys()
                .filter(|name| !name.starts_with('%') && !names.contains(name))
                .cloned()
                .collect();
            own.sort();
            names.extend(own);
            current = env.outer();
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_through_chain() {
        let global = Environment::new();
        global.define("x", Value::from(1.0), true);
        let inner = global.child();
        inner.define("y", Value::from(2.0), true);

        assert!(matches!(inner.lookup("x"), Lookup::Found(Value::Number(n)) if n == 1.0));
        assert!(matches!(global.lookup("y"), Lookup::Missing));
    }

    #[test]
    fn test_temporal_dead_zone() {
        let env = Environment::new();
        env.declare("x".into(), true);
        assert!(matches!(env.lookup("x"), Lookup::Uninitialized));
        assert_eq!(env.assign("x", Value::Null), Err(AssignError::Uninitialized));
        assert!(env.initialize("x", Value::Null));
        assert!(matches!(env.lookup("x"), Lookup::Found(Value::Null)));
    }

    #[test]
    fn test_const_assignment() {
        let env = Environment::new();
        env.define("PI", Value::from(3.14), false);
        assert_eq!(env.assign("PI", Value::from(3.0)), Err(AssignError::Constant));
        assert_eq!(env.assign("nope", Value::from(3.0)), Err(AssignError::Missing));
    }

    #[test]
    fn test_shadowing() {
        let outer = Environment::new();
        outer.define("x", Value::from(1.0), true);
        let inner = outer.child();
        inner.define("x", Value::from(2.0), true);
        inner.assign("x", Value::from(3.0)).unwrap();
        assert!(matches!(outer.lookup("x"), Lookup::Found(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_var_redeclaration_keeps_value() {
        let env = Environment::new();
        env.declare_var("v".into());
        env.assign("v", Value::from(5.0)).unwrap();
        env.declare_var("v".into());
        assert!(matches!(env.lookup("v"), Lookup::Found(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn test_initialize_nearest() {
        let outer = Environment::new();
        outer.declare("this".into(), false);
        let inner = outer.child();
        assert!(inner.initialize_nearest("this", Value::Null).is_ok());
        assert_eq!(
            inner.initialize_nearest("this", Value::Null),
            Err(AssignError::Constant)
        );
    }
}
