// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Errors surfaced by the engine to its host.

use crate::runtime::Value;
use std::fmt;

/// A value in flight after a `throw`, not yet caught.
#[derive(Debug, Clone)]
pub struct Throw(pub Value);

impl Throw {
    /// The thrown value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the thrown value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Throw {
    fn from(value: Value) -> Self {
        Throw(value)
    }
}

/// An uncaught exception, described for the host.
#[derive(Debug, Clone)]
pub struct Exception {
    name: String,
    message: String,
    value: Value,
}

impl Exception {
    /// Describes a thrown value.
    ///
    /// Objects contribute their `name` and `message` properties; any other
    /// value becomes the message of an exception named `Uncaught`.
    pub fn from_value(value: Value) -> Self {
        match value.as_object() {
            Some(object) => {
                let name = object.get("name");
                let message = object.get("message");
                Self {
                    name: if name.is_undefined() {
                        "Error".to_string()
                    } else {
                        name.to_display_string()
                    },
                    message: if message.is_undefined() {
                        value.to_display_string()
                    } else {
                        message.to_display_string()
                    },
                    value,
                }
            }
            None => Self {
                name: "Uncaught".to_string(),
                message: value.to_display_string(),
                value,
            },
        }
    }

    /// The error name (`Error`, `TypeError`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original thrown value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl From<Throw> for Exception {
    fn from(thrown: Throw) -> Self {
        Exception::from_value(thrown.0)
    }
}

/// Errors that can occur while parsing or running script code.
#[derive(Debug, Clone)]
pub enum Error {
    /// Syntax error during parsing
    Syntax {
        /// What the parser expected or found
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },
    /// A thrown value escaped to the host
    Uncaught(Exception),
}

impl Error {
    /// Returns the uncaught exception, if this is one.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Error::Uncaught(exception) => Some(exception),
            Error::Syntax { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax {
                message,
                line,
                column,
            } => write!(f, "SyntaxError: {} ({}:{})", message, line, column),
            Error::Uncaught(exception) => write!(f, "{}", exception),
        }
    }
}

impl std::error::Error for Error {}

impl From<Throw> for Error {
    fn from(thrown: Throw) -> Self {
        Error::Uncaught(thrown.into())
    }
}
