// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// How a module location is loaded, decided by its extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// `.js`: executed as a module body
    Script,
    /// `.json`: parsed and exported as data
    Json,
    /// Anything else (the extension, without the dot; empty if none)
    Unsupported(String),
}

impl ModuleKind {
    /// Classify a resolved location
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js") => Self::Script,
            Some("json") => Self::Json,
            Some(other) => Self::Unsupported(other.to_string()),
            None => Self::Unsupported(String::new()),
        }
    }
}

/// Turns a specifier plus the requesting module into a canonical location.
///
/// Resolution is lexical: the filesystem is never consulted, so a missing
/// file is reported when the loader tries to read it.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Directory for requests without a requesting module
    base_dir: PathBuf,
    /// Appended (with a dot) when the location has no extension
    default_extension: String,
}

impl ModuleResolver {
    /// Create a resolver; `base_dir` should be absolute
    pub fn new(base_dir: impl Into<PathBuf>, default_extension: &str) -> Self {
        Self {
            base_dir: normalize(&base_dir.into()),
            default_extension: default_extension.trim_start_matches('.').to_string(),
        }
    }

    /// The directory top-level requests are resolved against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `specifier` as requested by the module at `requester`
    pub fn resolve(&self, specifier: &str, requester: Option<&Path>) -> PathBuf {
        let requested = Path::new(specifier);
        if requested.is_absolute() {
            return normalize(requested);
        }

        let dir = requester.and_then(Path::parent).unwrap_or(&self.base_dir);
        let resolved = normalize(&dir.join(requested));
        if resolved.extension().is_some() {
            return resolved;
        }

        let mut with_extension = OsString::from(resolved);
        with_extension.push(".");
        with_extension.push(&self.default_extension);
        PathBuf::from(with_extension)
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. `..` never climbs above the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// The directory containing a module location
pub fn dirname(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ModuleResolver {
        ModuleResolver::new("/base", "js")
    }

    #[test]
    fn test_top_level_relative() {
        assert_eq!(resolver().resolve("./math", None), PathBuf::from("/base/math.js"));
        assert_eq!(resolver().resolve("math", None), PathBuf::from("/base/math.js"));
        assert_eq!(resolver().resolve("../lib/util", None), PathBuf::from("/lib/util.js"));
    }

    #[test]
    fn test_relative_to_requester_directory() {
        let requester = Path::new("/project/src/app.js");
        assert_eq!(
            resolver().resolve("./x", Some(requester)),
            PathBuf::from("/project/src/x.js")
        );
        assert_eq!(
            resolver().resolve("../shared/./y", Some(requester)),
            PathBuf::from("/project/shared/y.js")
        );
    }

    #[test]
    fn test_existing_extension_kept() {
        assert_eq!(
            resolver().resolve("./config.json", None),
            PathBuf::from("/base/config.json")
        );
        assert_eq!(
            resolver().resolve("./notes.txt", None),
            PathBuf::from("/base/notes.txt")
        );
        assert_eq!(
            resolver().resolve("./lib.v2/index", None),
            PathBuf::from("/base/lib.v2/index.js")
        );
    }

    #[test]
    fn test_absolute_is_only_normalized() {
        assert_eq!(
            resolver().resolve("/opt/mods/../mods/./a", Some(Path::new("/elsewhere/b.js"))),
            PathBuf::from("/opt/mods/a")
        );
    }

    #[test]
    fn test_default_extension_configurable() {
        let resolver = ModuleResolver::new("/base", ".json");
        assert_eq!(resolver.resolve("data", None), PathBuf::from("/base/data.json"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../../..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/a/./b/")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_module_kind() {
        assert_eq!(ModuleKind::of(Path::new("/a/m.js")), ModuleKind::Script);
        assert_eq!(ModuleKind::of(Path::new("/a/c.json")), ModuleKind::Json);
        assert_eq!(
            ModuleKind::of(Path::new("/a/n.node")),
            ModuleKind::Unsupported("node".to_string())
        );
        assert_eq!(ModuleKind::of(Path::new("/a/LICENSE")), ModuleKind::Unsupported(String::new()));
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname(Path::new("/a/b/c.js")), Path::new("/a/b"));
    }
}
