// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The tree-walking interpreter.
//!
//! ## Structure
//!
//! - `interpreter` - statement execution, expression evaluation, calls and
//!   classes (implemented as methods on [`Engine`](crate::Engine))
//! - `operators` - operator semantics and the conversions they need

mod interpreter;
pub(crate) mod operators;

pub(crate) use operators::power;
