/*
 * runtime.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * File-system and environment access used while loading documents.
 *
 * Directives never touch std::fs or std::env directly. Everything goes
 * through SystemRuntime so embedders and tests can supply their own view
 * of the world.
 */

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// The operations a load needs from its host.
pub trait SystemRuntime: Send + Sync {
    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Size of a file in bytes.
    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Absolute path with symlinks and `..` resolved. Fails if the path
    /// does not exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn is_dir(&self, path: &Path) -> bool;

    /// Value of an environment variable, if set and valid unicode.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Directory relative paths resolve against when nothing else applies.
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// Runtime backed by `std::fs` and the process environment.
///
/// Environment lookups can be overridden per runtime, which avoids
/// mutating the process environment (unsafe since edition 2024).
#[derive(Debug, Clone, Default)]
pub struct NativeRuntime {
    env_overrides: HashMap<String, Option<String>>,
}

impl NativeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `name` as set to `value`, regardless of the process environment.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(name.into(), Some(value.into()));
        self
    }

    /// Report `name` as unset, regardless of the process environment.
    pub fn without_env(mut self, name: impl Into<String>) -> Self {
        self.env_overrides.insert(name.into(), None);
        self
    }
}

impl SystemRuntime for NativeRuntime {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        match self.env_overrides.get(name) {
            Some(value) => value.clone(),
            None => std::env::var(name).ok(),
        }
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}
