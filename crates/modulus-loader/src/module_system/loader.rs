// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - reads and executes modules

use super::Shared;
use super::record::ModuleRecord;
use super::require::{self, FailureOrigin};
use super::resolver::ModuleKind;
use crate::error::{LoadError, Result};
use modulus_engine::{Engine, Error, ErrorKind, Exception, Value};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// The five bindings a module body receives.
///
/// Built fresh for every load and dropped when the body returns.
pub struct ModuleContext {
    /// The initial `module.exports` object, also the receiver (`this`)
    pub exports: Value,
    /// `require`, scoped to this module as the requester
    pub require: Value,
    /// The `module` object
    pub module: Value,
    /// Module identity
    pub filename: Value,
    /// Directory containing the module
    pub dirname: Value,
}

impl ModuleContext {
    /// Parameter names of the function a module body is compiled into
    pub const PARAMETERS: [&'static str; 5] =
        ["exports", "require", "module", "__filename", "__dirname"];

    pub(crate) fn new(shared: &Rc<Shared>, record: &ModuleRecord) -> Self {
        Self {
            exports: record.exports(),
            require: Value::Object(require::create_require_function(shared, record)),
            module: Value::Object(record.module_object().clone()),
            filename: Value::from(record.filename()),
            dirname: Value::from(record.dirname().to_string_lossy().into_owned()),
        }
    }

    /// The bindings in parameter order
    pub fn arguments(&self) -> [Value; 5] {
        [
            self.exports.clone(),
            self.require.clone(),
            self.module.clone(),
            self.filename.clone(),
            self.dirname.clone(),
        ]
    }

    /// The bindings paired with their names
    pub fn bindings(&self) -> [(&'static str, Value); 5] {
        let [exports, require, module, filename, dirname] = self.arguments();
        let [p0, p1, p2, p3, p4] = Self::PARAMETERS;
        [
            (p0, exports),
            (p1, require),
            (p2, module),
            (p3, filename),
            (p4, dirname),
        ]
    }
}

/// Load `record`, populating its exports
pub(crate) fn load(shared: &Rc<Shared>, record: &ModuleRecord) -> Result<()> {
    let path = record.identity();
    match ModuleKind::of(path) {
        ModuleKind::Script => load_script(shared, record),
        ModuleKind::Json => load_json(shared, record),
        ModuleKind::Unsupported(extension) => Err(LoadError::UnsupportedType {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

fn read_source(shared: &Shared, path: &Path) -> Result<String> {
    shared
        .fs
        .read_to_string(path)
        .map_err(|e| LoadError::read(path, e))
}

fn load_json(shared: &Rc<Shared>, record: &ModuleRecord) -> Result<()> {
    let path = record.identity();
    let content = read_source(shared, path)?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| LoadError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(path = %path.display(), "loaded JSON module");
    record.set_exports(Value::from_json(&shared.engine, &json));
    Ok(())
}

fn load_script(shared: &Rc<Shared>, record: &ModuleRecord) -> Result<()> {
    let path = record.identity();
    let source = read_source(shared, path)?;
    let engine = &shared.engine;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let wrapper = engine
        .compile_function(&name, &ModuleContext::PARAMETERS, &source)
        .map_err(|err| execution_error(engine, path, err))?;

    let context = ModuleContext::new(shared, record);
    debug!(path = %path.display(), "executing module");
    engine
        .call(&wrapper, context.exports.clone(), &context.arguments())
        .map_err(|thrown| execution_error(engine, path, Error::from(thrown)))?;
    Ok(())
}

/// Convert an engine failure in the module at `path` into a load error.
///
/// Syntax errors become `SyntaxError` exceptions. A thrown value that a
/// nested `require` raised keeps the failure it came from.
pub(crate) fn execution_error(engine: &Engine, path: &Path, err: Error) -> LoadError {
    let exception = match err {
        Error::Syntax {
            message,
            line,
            column,
        } => {
            let error = engine.new_error(
                ErrorKind::SyntaxError,
                format!("{} ({}:{}:{})", message, path.display(), line, column),
            );
            Exception::from_value(Value::Object(error))
        }
        Error::Uncaught(exception) => exception,
    };

    let origin = exception
        .value()
        .as_object()
        .and_then(|object| object.host_data::<FailureOrigin>());
    match origin.as_deref() {
        Some(FailureOrigin::Load(error)) => error.clone(),
        Some(FailureOrigin::Module(origin)) => LoadError::Execution {
            path: origin.clone(),
            exception,
        },
        None => LoadError::Execution {
            path: path.to_path_buf(),
            exception,
        },
    }
}
