// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime values, objects, functions and scopes.

pub mod context;
pub mod environment;
pub mod function;
pub mod object;
pub mod value;

pub use context::{Context, DEFAULT_MAX_CALL_DEPTH, Intrinsics};
pub use environment::{AssignError, Environment, Lookup};
pub use function::{Closure, ClosureKind, Function, NativeFn, NativeFunction};
pub use object::{ObjectClass, ObjectKind, ObjectRef, array_index};
pub use value::{CircularStructure, Value, number_to_string, string_to_number};
