// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.
//!
//! Sources are applied in order, later ones winning: built-in defaults, a
//! TOML file, then the environment. Command-line flags are applied on top
//! by the binary.

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no file is given.
pub const CONFIG_FILE_NAME: &str = "modulus.toml";

/// Environment variable overriding the base directory.
pub const BASE_DIR_ENV: &str = "MODULUS_BASE_DIR";

/// Extensions the loader knows how to execute.
pub const RECOGNIZED_EXTENSIONS: [&str; 2] = ["js", "json"];

/// Configuration for a module system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoaderConfig {
    /// Directory top-level requests are resolved against (defaults to the
    /// working directory)
    pub base_dir: Option<PathBuf>,

    /// Nested script calls allowed before a RangeError is raised
    pub max_call_depth: usize,

    /// Extension appended to locations that have none
    pub default_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_call_depth: modulus_engine::runtime::DEFAULT_MAX_CALL_DEPTH,
            default_extension: "js".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from `path`, or from `modulus.toml` in the working
    /// directory if it exists, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::from_file(&local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoadError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| LoadError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| LoadError::config(e.message()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from environment variables, read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var(BASE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.base_dir = Some(PathBuf::from(dir));
        }
    }

    /// Check the values for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 {
            return Err(LoadError::config("max-call-depth must be at least 1"));
        }
        let extension = self.default_extension.trim_start_matches('.');
        if !RECOGNIZED_EXTENSIONS.contains(&extension) {
            return Err(LoadError::config(format!(
                "default-extension must be one of {:?}, got {:?}",
                RECOGNIZED_EXTENSIONS, self.default_extension
            )));
        }
        Ok(())
    }

    /// The absolute base directory: the configured one (relative paths are
    /// taken from the working directory) or the working directory itself.
    pub fn resolve_base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            configured => {
                let cwd = std::env::current_dir().map_err(|e| {
                    LoadError::config(format!("cannot determine the working directory: {}", e))
                })?;
                Ok(match configured {
                    Some(dir) => cwd.join(dir),
                    None => cwd,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.base_dir, None);
        assert_eq!(config.default_extension, "js");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = LoaderConfig::from_toml(
            r#"
            base-dir = "/srv/app"
            max-call-depth = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.base_dir, Some(PathBuf::from("/srv/app")));
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.default_extension, "js");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = LoaderConfig::from_toml("registry = \"x\"").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(LoaderConfig::from_toml("max-call-depth = 0").is_err());
        assert!(LoaderConfig::from_toml("default-extension = \"ts\"").is_err());
        assert!(LoaderConfig::from_toml("default-extension = \".json\"").is_ok());
    }

    #[test]
    fn test_env_override() {
        let mut config = LoaderConfig::from_toml("base-dir = \"/from/file\"").unwrap();
        config.apply_env(|name| (name == BASE_DIR_ENV).then(|| "/from/env".to_string()));
        assert_eq!(config.base_dir, Some(PathBuf::from("/from/env")));

        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.base_dir, Some(PathBuf::from("/from/env")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "max-call-depth = 10\n").unwrap();
        assert_eq!(LoaderConfig::from_file(&path).unwrap().max_call_depth, 10);

        let err = LoaderConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration: cannot read"));
    }

    #[test]
    fn test_resolve_base_dir() {
        let config = LoaderConfig {
            base_dir: Some(PathBuf::from("/abs")),
            ..LoaderConfig::default()
        };
        assert_eq!(config.resolve_base_dir().unwrap(), PathBuf::from("/abs"));

        let relative = LoaderConfig {
            base_dir: Some(PathBuf::from("rel")),
            ..LoaderConfig::default()
        };
        let resolved = relative.resolve_base_dir().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("rel"));
    }
}
