// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use modulus_engine::Exception;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for module loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while loading a module
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The module source could not be read
    #[error("{}", read_message(.path, .source))]
    Read {
        /// Resolved module location
        path: PathBuf,
        /// Underlying I/O error
        source: Arc<io::Error>,
    },

    /// A JSON module failed to parse
    #[error("{}: {message}", .path.display())]
    Format {
        /// Resolved module location
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Module code threw while executing (syntax errors included)
    #[error("{exception}")]
    Execution {
        /// The module whose code threw
        path: PathBuf,
        /// The uncaught exception
        exception: Exception,
    },

    /// The location has an extension the loader does not handle
    #[error("Unknown file extension \".{extension}\" for {}", .path.display())]
    UnsupportedType {
        /// Resolved module location
        path: PathBuf,
        /// The unrecognized extension, without the dot
        extension: String,
    },

    /// Invalid loader configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn read_message(path: &Path, source: &io::Error) -> String {
    if source.kind() == io::ErrorKind::NotFound {
        format!("Cannot find module '{}'", path.display())
    } else {
        format!("Cannot read module '{}': {}", path.display(), source)
    }
}

impl LoadError {
    /// Create a read error from an I/O failure
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The module location the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. }
            | Self::Format { path, .. }
            | Self::Execution { path, .. }
            | Self::UnsupportedType { path, .. } => Some(path),
            Self::Config(_) => None,
        }
    }

    /// The uncaught script exception behind an execution failure
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Self::Execution { exception, .. } => Some(exception),
            _ => None,
        }
    }

    /// Returns true if the module file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The `code` property carried by the error object thrown into scripts
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Read { .. } if self.is_not_found() => Some("MODULE_NOT_FOUND"),
            Self::Read { .. } => Some("ERR_MODULE_READ"),
            Self::Format { .. } => Some("ERR_INVALID_JSON"),
            Self::UnsupportedType { .. } => Some("ERR_UNKNOWN_FILE_EXTENSION"),
            Self::Execution { .. } | Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = LoadError::read(
            "/app/missing.js",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cannot find module '/app/missing.js'");
        assert_eq!(err.code(), Some("MODULE_NOT_FOUND"));
    }

    #[test]
    fn test_other_read_failure() {
        let err = LoadError::read(
            "/app/locked.js",
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Cannot read module '/app/locked.js': permission denied"
        );
    }

    #[test]
    fn test_format_message_includes_location() {
        let err = LoadError::Format {
            path: PathBuf::from("/app/config.json"),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "/app/config.json: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = LoadError::UnsupportedType {
            path: PathBuf::from("/app/notes.txt"),
            extension: "txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown file extension \".txt\" for /app/notes.txt"
        );
        assert_eq!(err.path(), Some(Path::new("/app/notes.txt")));
    }
}
