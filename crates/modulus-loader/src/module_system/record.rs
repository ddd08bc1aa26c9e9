// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records

use super::resolver::dirname;
use modulus_engine::{Engine, ObjectRef, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One loaded (or loading) module.
///
/// A cheap handle: clones refer to the same record. The exports live on the
/// script-visible `module` object, so `module.exports = x` inside the module
/// body and [`ModuleRecord::set_exports`] from the host are the same write.
/// Relationships to other modules are stored as identities and looked up
/// through the cache.
#[derive(Clone)]
pub struct ModuleRecord(Rc<RecordData>);

struct RecordData {
    identity: PathBuf,
    module: ObjectRef,
    requested_by: Option<PathBuf>,
    dependents: RefCell<Vec<PathBuf>>,
    loaded: Cell<bool>,
}

impl ModuleRecord {
    /// Create a record with an empty exports object
    pub(crate) fn new(engine: &Engine, identity: PathBuf, requested_by: Option<PathBuf>) -> Self {
        let filename = Value::from(identity.to_string_lossy().into_owned());
        let module = engine.new_object();
        module.set("id", filename.clone());
        module.set("filename", filename);
        module.set("path", dirname(&identity).to_string_lossy().into_owned());
        module.set("exports", engine.new_object());
        module.set("loaded", false);

        Self(Rc::new(RecordData {
            identity,
            module,
            requested_by,
            dependents: RefCell::new(Vec::new()),
            loaded: Cell::new(false),
        }))
    }

    /// Canonical location; the cache key
    pub fn identity(&self) -> &Path {
        &self.0.identity
    }

    /// The identity as the string given to module code as `__filename`
    pub fn filename(&self) -> String {
        self.0.identity.to_string_lossy().into_owned()
    }

    /// Directory containing the module
    pub fn dirname(&self) -> &Path {
        dirname(&self.0.identity)
    }

    /// The `module` object passed to module code
    pub fn module_object(&self) -> &ObjectRef {
        &self.0.module
    }

    /// Current exports (whatever `module.exports` holds right now)
    pub fn exports(&self) -> Value {
        self.0.module.get("exports")
    }

    /// Replace the exports
    pub fn set_exports(&self, exports: Value) {
        self.0.module.set("exports", exports);
    }

    /// Identity of the module whose request caused this load
    pub fn requested_by(&self) -> Option<&Path> {
        self.0.requested_by.as_deref()
    }

    /// Identities of the modules this one caused to load, in order
    pub fn dependents(&self) -> Vec<PathBuf> {
        self.0.dependents.borrow().clone()
    }

    pub(crate) fn add_dependent(&self, identity: &Path) {
        self.0.dependents.borrow_mut().push(identity.to_path_buf());
    }

    pub(crate) fn remove_dependent(&self, identity: &Path) {
        self.0.dependents.borrow_mut().retain(|dependent| dependent != identity);
    }

    /// Whether execution finished without failure
    pub fn is_loaded(&self) -> bool {
        self.0.loaded.get()
    }

    pub(crate) fn mark_loaded(&self) {
        self.0.loaded.set(true);
        self.0.module.set("loaded", true);
    }

    /// Returns true if both handles refer to the same record
    pub fn ptr_eq(&self, other: &ModuleRecord) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("identity", &self.0.identity)
            .field("requested_by", &self.0.requested_by)
            .field("dependents", &self.0.dependents.borrow())
            .field("loaded", &self.0.loaded.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record() {
        let engine = Engine::new();
        let record = ModuleRecord::new(&engine, PathBuf::from("/app/lib/math.js"), None);
        assert_eq!(record.identity(), Path::new("/app/lib/math.js"));
        assert_eq!(record.dirname(), Path::new("/app/lib"));
        assert!(!record.is_loaded());
        assert!(record.exports().as_object().is_some());
        assert_eq!(record.module_object().get("path"), Value::from("/app/lib"));
        assert_eq!(record.module_object().get("loaded"), Value::Boolean(false));
    }

    #[test]
    fn test_exports_follow_module_object() {
        let engine = Engine::new();
        let record = ModuleRecord::new(&engine, PathBuf::from("/m.js"), None);
        record.module_object().set("exports", 42.0);
        assert_eq!(record.exports(), Value::Number(42.0));

        record.set_exports(Value::from("replaced"));
        assert_eq!(record.module_object().get("exports"), Value::from("replaced"));
    }

    #[test]
    fn test_links_and_completion() {
        let engine = Engine::new();
        let parent = ModuleRecord::new(&engine, PathBuf::from("/a.js"), None);
        let child = ModuleRecord::new(&engine, PathBuf::from("/b.js"), Some(PathBuf::from("/a.js")));
        parent.add_dependent(child.identity());
        assert_eq!(parent.dependents(), vec![PathBuf::from("/b.js")]);
        assert_eq!(child.requested_by(), Some(Path::new("/a.js")));

        child.mark_loaded();
        assert!(child.is_loaded());
        assert_eq!(child.module_object().get("loaded"), Value::Boolean(true));

        parent.remove_dependent(child.identity());
        assert!(parent.dependents().is_empty());
        assert!(child.clone().ptr_eq(&child));
    }
}
