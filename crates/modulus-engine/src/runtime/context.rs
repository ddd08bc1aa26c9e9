// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution context: global scope, intrinsic prototypes and call depth.

use super::environment::Environment;
use super::object::{ObjectKind, ObjectRef};
use crate::builtins::console::Console;
use crate::builtins::error::ErrorKind;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default limit on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Prototype objects shared by every value of a kind.
pub struct Intrinsics {
    /// `Object.prototype`
    pub object_prototype: ObjectRef,
    /// `Function.prototype`
    pub function_prototype: ObjectRef,
    /// `Array.prototype`
    pub array_prototype: ObjectRef,
    /// `String.prototype`
    pub string_prototype: ObjectRef,
    /// `Number.prototype`
    pub number_prototype: ObjectRef,
    /// `Boolean.prototype`
    pub boolean_prototype: ObjectRef,
    /// `Error.prototype`
    pub error_prototype: ObjectRef,
    /// `TypeError.prototype`
    pub type_error_prototype: ObjectRef,
    /// `RangeError.prototype`
    pub range_error_prototype: ObjectRef,
    /// `ReferenceError.prototype`
    pub reference_error_prototype: ObjectRef,
    /// `SyntaxError.prototype`
    pub syntax_error_prototype: ObjectRef,
}

impl Intrinsics {
    fn new() -> Self {
        let object_prototype = ObjectRef::new(ObjectKind::Ordinary, None);
        let derived = |parent: &ObjectRef| ObjectRef::new(ObjectKind::Ordinary, Some(parent.clone()));
        let error_prototype = derived(&object_prototype);
        Self {
            function_prototype: derived(&object_prototype),
            array_prototype: derived(&object_prototype),
            string_prototype: derived(&object_prototype),
            number_prototype: derived(&object_prototype),
            boolean_prototype: derived(&object_prototype),
            type_error_prototype: derived(&error_prototype),
            range_error_prototype: derived(&error_prototype),
            reference_error_prototype: derived(&error_prototype),
            syntax_error_prototype: derived(&error_prototype),
            error_prototype,
            object_prototype,
        }
    }

    /// The prototype shared by errors of `kind`.
    pub fn error_prototype_for(&self, kind: ErrorKind) -> &ObjectRef {
        match kind {
            ErrorKind::Error => &self.error_prototype,
            ErrorKind::TypeError => &self.type_error_prototype,
            ErrorKind::RangeError => &self.range_error_prototype,
            ErrorKind::ReferenceError => &self.reference_error_prototype,
            ErrorKind::SyntaxError => &self.syntax_error_prototype,
        }
    }
}

/// The execution context shared by an engine and its clones.
pub struct Context {
    pub(crate) global: Environment,
    pub(crate) intrinsics: Intrinsics,
    pub(crate) console: Rc<dyn Console>,
    max_call_depth: usize,
    depth: Cell<usize>,
    seed: Cell<u64>,
}

impl Context {
    /// Creates a context with empty prototypes; builtins are installed by
    /// the engine afterwards.
    pub fn new(console: Rc<dyn Console>, max_call_depth: usize) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x2545_f491_4f6c_dd1d);

        Self {
            global: Environment::new(),
            intrinsics: Intrinsics::new(),
            console,
            max_call_depth,
            depth: Cell::new(0),
            seed: Cell::new(seed | 1),
        }
    }

    /// Maximum nesting of calls before a RangeError is raised.
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Current call nesting.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enters a call frame, or returns `None` when the limit is reached.
    pub(crate) fn enter(&self) -> Option<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.max_call_depth {
            return None;
        }
        self.depth.set(depth + 1);
        Some(DepthGuard(&self.depth))
    }

    /// xorshift64* in `[0, 1)`.
    pub(crate) fn next_random(&self) -> f64 {
        let mut x = self.seed.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.seed.set(x);
        let bits = x.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}

/// Leaves a call frame when dropped.
pub(crate) struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::console::CapturedConsole;

    #[test]
    fn test_depth_guard() {
        let context = Context::new(Rc::new(CapturedConsole::default()), 2);
        let first = context.enter().unwrap();
        let second = context.enter().unwrap();
        assert!(context.enter().is_none());
        drop(second);
        assert_eq!(context.depth(), 1);
        drop(first);
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_random_range() {
        let context = Context::new(Rc::new(CapturedConsole::default()), 2);
        for _ in 0..1000 {
            let r = context.next_random();
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_intrinsics_share_object_prototype() {
        let intrinsics = Intrinsics::new();
        let parent = intrinsics.array_prototype.prototype().unwrap();
        assert!(parent.ptr_eq(&intrinsics.object_prototype));
        assert!(intrinsics.object_prototype.prototype().is_none());
    }
}
