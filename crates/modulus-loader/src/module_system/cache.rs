// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use super::record::ModuleRecord;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Snapshot of the cache contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    /// Number of cached modules
    pub count: usize,
    /// Their identities, in insertion order
    pub modules: Vec<PathBuf>,
}

/// Identity-keyed module records.
///
/// Records are inserted before their code runs, so a cyclic request finds
/// the partially loaded record instead of loading it again. Borrows are
/// released before every method returns; the cache may be used from inside
/// module code.
#[derive(Debug, Default)]
pub struct ModuleCache {
    records: RefCell<FxHashMap<PathBuf, ModuleRecord>>,
    order: RefCell<Vec<PathBuf>>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached module by identity
    pub fn get(&self, identity: &Path) -> Option<ModuleRecord> {
        self.records.borrow().get(identity).cloned()
    }

    /// Check if a module is cached
    pub fn has(&self, identity: &Path) -> bool {
        self.records.borrow().contains_key(identity)
    }

    /// Add a module, replacing any record with the same identity
    pub fn insert(&self, record: ModuleRecord) {
        let identity = record.identity().to_path_buf();
        if self.records.borrow_mut().insert(identity.clone(), record).is_none() {
            self.order.borrow_mut().push(identity);
        }
    }

    /// Remove a module from the cache
    pub fn remove(&self, identity: &Path) -> Option<ModuleRecord> {
        let removed = self.records.borrow_mut().remove(identity)?;
        self.order.borrow_mut().retain(|key| key != identity);
        Some(removed)
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
        self.order.borrow_mut().clear();
    }

    /// Cached identities in insertion order
    pub fn keys(&self) -> Vec<PathBuf> {
        self.order.borrow().clone()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Count and identities of the cached modules
    pub fn info(&self) -> CacheInfo {
        let modules = self.keys();
        CacheInfo {
            count: modules.len(),
            modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulus_engine::Engine;

    fn record(engine: &Engine, path: &str) -> ModuleRecord {
        ModuleRecord::new(engine, PathBuf::from(path), None)
    }

    #[test]
    fn test_insert_get_remove() {
        let engine = Engine::new();
        let cache = ModuleCache::new();
        let a = record(&engine, "/a.js");
        cache.insert(a.clone());

        assert!(cache.has(Path::new("/a.js")));
        assert!(cache.get(Path::new("/a.js")).unwrap().ptr_eq(&a));
        assert!(cache.remove(Path::new("/a.js")).is_some());
        assert!(cache.remove(Path::new("/a.js")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let engine = Engine::new();
        let cache = ModuleCache::new();
        for path in ["/c.js", "/a.js", "/b.js"] {
            cache.insert(record(&engine, path));
        }
        cache.remove(Path::new("/a.js"));
        cache.insert(record(&engine, "/a.js"));

        assert_eq!(
            cache.info(),
            CacheInfo {
                count: 3,
                modules: vec![
                    PathBuf::from("/c.js"),
                    PathBuf::from("/b.js"),
                    PathBuf::from("/a.js"),
                ],
            }
        );
    }

    #[test]
    fn test_replace_keeps_one_entry() {
        let engine = Engine::new();
        let cache = ModuleCache::new();
        cache.insert(record(&engine, "/a.js"));
        let replacement = record(&engine, "/a.js");
        cache.insert(replacement.clone());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(Path::new("/a.js")).unwrap().ptr_eq(&replacement));
    }

    #[test]
    fn test_clear_keeps_handed_out_records() {
        let engine = Engine::new();
        let cache = ModuleCache::new();
        let a = record(&engine, "/a.js");
        cache.insert(a.clone());
        let exports = a.exports();

        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(cache.keys().is_empty());
        assert!(exports.strict_equals(&a.exports()));
    }
}
