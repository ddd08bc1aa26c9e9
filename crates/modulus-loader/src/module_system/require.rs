// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS require() implementation

use super::Shared;
use super::loader;
use super::record::ModuleRecord;
use crate::error::{LoadError, Result};
use modulus_engine::{Engine, ErrorKind, ObjectRef, Throw, Value};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Where a failure thrown into module code by `require` came from.
///
/// Attached to the thrown error object so the failure reaches the host
/// unchanged when module code does not catch it.
pub(crate) enum FailureOrigin {
    /// A load failure that is not a script exception
    Load(LoadError),
    /// An exception thrown by the code of this module
    Module(PathBuf),
}

/// The require() algorithm.
///
/// A cached record is returned as is, even while it is still loading; this
/// is what lets circular requests terminate. A new record is cached before
/// its code runs and evicted again if loading fails.
pub(crate) fn require(
    shared: &Rc<Shared>,
    specifier: &str,
    requester: Option<&ModuleRecord>,
) -> Result<Value> {
    let identity = shared
        .resolver
        .resolve(specifier, requester.map(ModuleRecord::identity));

    if let Some(cached) = shared.cache.get(&identity) {
        debug!(
            path = %identity.display(),
            loaded = cached.is_loaded(),
            "module cache hit"
        );
        return Ok(cached.exports());
    }

    let record = ModuleRecord::new(
        &shared.engine,
        identity.clone(),
        requester.map(|r| r.identity().to_path_buf()),
    );
    if let Some(requester) = requester {
        requester.add_dependent(&identity);
    }
    shared.cache.insert(record.clone());
    debug!(path = %identity.display(), "loading module");

    match loader::load(shared, &record) {
        Ok(()) => {
            record.mark_loaded();
            Ok(record.exports())
        }
        Err(err) => {
            warn!(path = %identity.display(), error = %err, "module failed to load; evicting");
            shared.cache.remove(&identity);
            if let Some(requester) = requester {
                requester.remove_dependent(&identity);
            }
            Err(err)
        }
    }
}

/// Build the `require` function given to the module `record`.
///
/// It holds the module system weakly so that exports retaining it do not
/// keep the whole system alive.
pub(crate) fn create_require_function(shared: &Rc<Shared>, record: &ModuleRecord) -> ObjectRef {
    let engine = &shared.engine;

    let weak = Rc::downgrade(shared);
    let requester = record.clone();
    let require_fn = engine.native_function("require", 1, move |engine, _this, args| {
        let specifier = specifier_arg(engine, args)?;
        let shared = upgrade(engine, &weak)?;
        require(&shared, &specifier, Some(&requester))
            .map_err(|err| throw_load_error(engine, err))
    });

    let weak = Rc::downgrade(shared);
    let requester = record.clone();
    let resolve_fn = engine.native_function("resolve", 1, move |engine, _this, args| {
        let specifier = specifier_arg(engine, args)?;
        let shared = upgrade(engine, &weak)?;
        let resolved = shared
            .resolver
            .resolve(&specifier, Some(requester.identity()));
        Ok(Value::from(resolved.to_string_lossy().into_owned()))
    });

    require_fn.define_hidden("resolve", resolve_fn);
    require_fn
}

fn specifier_arg(engine: &Engine, args: &[Value]) -> std::result::Result<String, Throw> {
    match args.first() {
        Some(Value::String(specifier)) if !specifier.is_empty() => Ok(specifier.to_string()),
        Some(Value::String(_)) => Err(engine.throw(
            ErrorKind::TypeError,
            "The argument 'id' must be a non-empty string. Received ''",
        )),
        other => Err(engine.throw(
            ErrorKind::TypeError,
            format!(
                "The \"id\" argument must be of type string. Received {}",
                other.map(Value::type_of).unwrap_or("undefined")
            ),
        )),
    }
}

fn upgrade(engine: &Engine, weak: &Weak<Shared>) -> std::result::Result<Rc<Shared>, Throw> {
    weak.upgrade().ok_or_else(|| {
        engine.throw(
            ErrorKind::Error,
            "require() called after its module system was dropped",
        )
    })
}

/// Turn a load failure into a value thrown into the requiring module.
///
/// Script exceptions are rethrown as the same value. Other failures become
/// `Error` objects (`SyntaxError` for malformed JSON) with a `code`.
fn throw_load_error(engine: &Engine, err: LoadError) -> Throw {
    if let LoadError::Execution { path, exception } = err {
        let value = exception.value().clone();
        if let Value::Object(object) = &value {
            if object.host_data::<FailureOrigin>().is_none() {
                object.set_host_data(Rc::new(FailureOrigin::Module(path)));
            }
        }
        return Throw(value);
    }

    let kind = match err {
        LoadError::Format { .. } => ErrorKind::SyntaxError,
        _ => ErrorKind::Error,
    };
    let error = engine.new_error(kind, err.to_string());
    if let Some(code) = err.code() {
        error.set("code", code);
    }
    if let Some(path) = err.path() {
        error.set("path", path.to_string_lossy().into_owned());
    }
    error.set_host_data(Rc::new(FailureOrigin::Load(err)));
    Throw(Value::Object(error))
}
