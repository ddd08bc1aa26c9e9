// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modulus-loader
//!
//! A CommonJS-style module loader on top of `modulus-engine`.
//!
//! Given a module identifier it resolves a location, loads and executes the
//! module exactly once, caches the result and gives every module its own
//! scope with five bindings: `exports`, `require`, `module`, `__filename`
//! and `__dirname`.
//!
//! - `.js` modules run as the body of a function taking those bindings, so
//!   nothing they declare leaks into the global scope
//! - `.json` modules export their parsed contents
//! - Circular requests receive the exports of the module that is still
//!   loading instead of recursing
//! - A module that fails to load is evicted so a later request retries it
//!
//! ## Quick Start
//!
//! ```rust
//! use modulus_loader::{LoaderConfig, MemoryFileSystem, ModuleSystem};
//! use std::rc::Rc;
//!
//! let fs = MemoryFileSystem::new()
//!     .with_file("/app/math.js", "exports.add = (a, b) => a + b;");
//! let config = LoaderConfig {
//!     base_dir: Some("/app".into()),
//!     ..LoaderConfig::default()
//! };
//! let system = ModuleSystem::builder(config)
//!     .file_system(Rc::new(fs))
//!     .build()
//!     .unwrap();
//!
//! let math = system.require("./math").unwrap();
//! let add = system.engine().get(&math, "add").unwrap();
//! let sum = system
//!     .engine()
//!     .call(&add, math.clone(), &[1.0.into(), 2.0.into()])
//!     .unwrap();
//! assert_eq!(sum.as_number(), Some(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fs;
pub mod module_system;

// Re-exports
pub use config::LoaderConfig;
pub use error::{LoadError, Result};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use module_system::{
    CacheInfo, ModuleCache, ModuleContext, ModuleKind, ModuleRecord, ModuleResolver, ModuleSystem,
    ModuleSystemBuilder, Session,
};
pub use modulus_engine::{Engine, Value};

/// Version of the module loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
