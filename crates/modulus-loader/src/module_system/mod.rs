// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS module system
//!
//! - `require()` with directory-relative resolution
//! - `module.exports` / `exports`
//! - Synchronous, depth-first loading
//! - Circular dependencies see the partially populated exports of a module
//!   that is still loading
//! - Failed loads are evicted from the cache so they can be retried

mod cache;
mod loader;
mod record;
mod require;
mod resolver;

pub use cache::{CacheInfo, ModuleCache};
pub use loader::ModuleContext;
pub use record::ModuleRecord;
pub use resolver::{ModuleKind, ModuleResolver, dirname, normalize};

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::fs::{FileSystem, OsFileSystem};
use modulus_engine::{Console, Engine, EngineOptions, Environment, StdConsole, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// State shared by a module system and the `require` functions it hands to
/// module code.
pub(crate) struct Shared {
    pub(crate) engine: Engine,
    pub(crate) resolver: ModuleResolver,
    pub(crate) cache: Rc<ModuleCache>,
    pub(crate) fs: Rc<dyn FileSystem>,
    pub(crate) config: LoaderConfig,
}

/// A module system: resolver, cache and loader over one script engine.
///
/// Cloning yields another handle to the same system.
#[derive(Clone)]
pub struct ModuleSystem {
    shared: Rc<Shared>,
}

impl ModuleSystem {
    /// Create a module system reading from the real filesystem and printing
    /// console output to stdout/stderr
    pub fn new(config: LoaderConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start configuring a module system
    pub fn builder(config: LoaderConfig) -> ModuleSystemBuilder {
        ModuleSystemBuilder {
            config,
            fs: None,
            console: None,
            cache: None,
        }
    }

    /// Load a module by specifier, resolving relative to the base directory
    pub fn require(&self, specifier: &str) -> Result<Value> {
        require::require(&self.shared, specifier, None)
    }

    /// Load a module on behalf of `requester`
    pub fn require_from(&self, specifier: &str, requester: &ModuleRecord) -> Result<Value> {
        require::require(&self.shared, specifier, Some(requester))
    }

    /// Resolve a specifier without loading it
    pub fn resolve(&self, specifier: &str, requester: Option<&ModuleRecord>) -> PathBuf {
        self.shared
            .resolver
            .resolve(specifier, requester.map(ModuleRecord::identity))
    }

    /// Look up a cached module by location
    pub fn module(&self, identity: &Path) -> Option<ModuleRecord> {
        self.shared.cache.get(identity)
    }

    /// Count and identities of the cached modules
    pub fn cache_info(&self) -> CacheInfo {
        self.shared.cache.info()
    }

    /// Forget every cached module. Exports already handed out stay valid.
    pub fn clear_cache(&self) {
        debug!(count = self.shared.cache.len(), "clearing module cache");
        self.shared.cache.clear();
    }

    /// Evaluate inline source as an uncached module located at
    /// `<base dir>/[eval]`, returning its completion value
    pub fn evaluate(&self, source: &str) -> Result<Value> {
        self.session("[eval]").evaluate(source)
    }

    /// Create a session: a persistent uncached module scope for evaluating
    /// source piece by piece (the REPL)
    pub fn session(&self, name: &str) -> Session {
        let identity = self.shared.resolver.base_dir().join(name);
        let record = ModuleRecord::new(&self.shared.engine, identity, None);
        let context = ModuleContext::new(&self.shared, &record);
        let scope = self
            .shared
            .engine
            .create_scope(&context.bindings(), context.exports.clone());
        Session {
            shared: self.shared.clone(),
            record,
            scope,
        }
    }

    /// The module cache
    pub fn cache(&self) -> &Rc<ModuleCache> {
        &self.shared.cache
    }

    /// The script engine module code runs on
    pub fn engine(&self) -> &Engine {
        &self.shared.engine
    }

    /// The configuration this system was built with
    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    /// The directory top-level requests are resolved against
    pub fn base_dir(&self) -> &Path {
        self.shared.resolver.base_dir()
    }
}

/// Builder for [`ModuleSystem`]
pub struct ModuleSystemBuilder {
    config: LoaderConfig,
    fs: Option<Rc<dyn FileSystem>>,
    console: Option<Rc<dyn Console>>,
    cache: Option<Rc<ModuleCache>>,
}

impl ModuleSystemBuilder {
    /// Read module sources from `fs`
    pub fn file_system(mut self, fs: Rc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Send `console.*` output from module code to `console`
    pub fn console(mut self, console: Rc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    /// Use an existing cache
    pub fn cache(mut self, cache: Rc<ModuleCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate the configuration and create the module system
    pub fn build(self) -> Result<ModuleSystem> {
        self.config.validate()?;
        let base_dir = self.config.resolve_base_dir()?;
        let engine = Engine::with_options(
            self.console.unwrap_or_else(|| Rc::new(StdConsole)),
            EngineOptions {
                max_call_depth: self.config.max_call_depth,
            },
        );
        let resolver = ModuleResolver::new(base_dir, &self.config.default_extension);
        debug!(base_dir = %resolver.base_dir().display(), "module system ready");

        Ok(ModuleSystem {
            shared: Rc::new(Shared {
                engine,
                resolver,
                cache: self.cache.unwrap_or_default(),
                fs: self.fs.unwrap_or_else(|| Rc::new(OsFileSystem)),
                config: self.config,
            }),
        })
    }
}

/// A persistent module scope for evaluating source incrementally.
///
/// Declarations made by one [`Session::evaluate`] call are visible to the
/// next. The session's module is never cached.
pub struct Session {
    shared: Rc<Shared>,
    record: ModuleRecord,
    scope: Environment,
}

impl Session {
    /// Evaluate source in the session scope and return its completion value
    pub fn evaluate(&self, source: &str) -> Result<Value> {
        self.shared
            .engine
            .eval_in(source, &self.scope)
            .map_err(|err| loader::execution_error(&self.shared.engine, self.record.identity(), err))
    }

    /// The session's pseudo-module
    pub fn record(&self) -> &ModuleRecord {
        &self.record
    }

    /// Names visible in the session scope (for completion)
    pub fn visible_names(&self) -> Vec<Rc<str>> {
        self.scope.visible_names()
    }
}
