// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem access used by the loader.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

/// Source of module text.
pub trait FileSystem {
    /// Read the whole file at `path` as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory filesystem for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<FxHashMap<PathBuf, String>>,
    reads: RefCell<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    /// Remove a file
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.borrow_mut().remove(path)
    }

    /// Every path read so far, in order
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.borrow().clone()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.reads.borrow_mut().push(path.to_path_buf());
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_file_system() {
        let fs = MemoryFileSystem::new().with_file("/app/a.js", "exports.a = 1;");
        assert_eq!(fs.read_to_string(Path::new("/app/a.js")).unwrap(), "exports.a = 1;");

        let err = fs.read_to_string(Path::new("/app/b.js")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs.reads().len(), 2);

        fs.remove(Path::new("/app/a.js"));
        assert!(fs.read_to_string(Path::new("/app/a.js")).is_err());
    }

    #[test]
    fn test_os_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.js");
        std::fs::write(&path, "module.exports = 1;").unwrap();
        assert_eq!(OsFileSystem.read_to_string(&path).unwrap(), "module.exports = 1;");
        assert!(OsFileSystem.read_to_string(&dir.path().join("none.js")).is_err());
    }
}
