//! Argument, name and path checks shared by the directives.

use crate::error::{Error, Result};
use crate::options::TRUTHY_VALUES;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

/// Number of arguments a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCount {
    Exact(usize),
    /// Inclusive bounds.
    Range(usize, usize),
}

impl ArgCount {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            ArgCount::Exact(n) => count == n,
            ArgCount::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

pub fn validate_arg_count(count: usize, expected: ArgCount, directive: &str) -> Result<()> {
    if expected.accepts(count) {
        return Ok(());
    }
    let message = match expected {
        ArgCount::Exact(n) => {
            format!("!{directive} expects exactly {n} argument(s), got {count}")
        }
        ArgCount::Range(min, max) if min == max => {
            format!("!{directive} expects {min} argument(s), got {count}")
        }
        ArgCount::Range(min, max) => {
            format!("!{directive} expects {min}-{max} argument(s), got {count}")
        }
    };
    Err(Error::constructor(message))
}

pub fn validate_filename(filename: &str, directive: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(Error::constructor(format!(
            "!{directive} requires a non-empty filename"
        )));
    }
    if filename.contains('\0') {
        return Err(Error::constructor(format!(
            "!{directive} filename contains null byte"
        )));
    }
    Ok(())
}

pub fn validate_env_var_name(name: &str, directive: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::constructor(format!(
            "!{directive} requires a non-empty variable name"
        )));
    }
    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(Error::constructor(format!(
            "!{directive} invalid environment variable name: {name}"
        )));
    }
    Ok(())
}

pub fn validate_template_name(name: &str, directive: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::constructor(format!(
            "!{directive} requires a non-empty template name"
        )));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_path(format!(
            "!{directive} template name cannot contain path separators: {name}"
        )));
    }
    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(Error::invalid_path(format!(
            "!{directive} invalid template name: {name}"
        )));
    }
    Ok(())
}

/// Fail if importing `path` would close a cycle or exceed the depth limit.
pub fn check_recursion_limit(import_stack: &[PathBuf], path: &Path, max_depth: usize) -> Result<()> {
    if import_stack.iter().any(|p| p == path) {
        return Err(Error::recursion_limit(format!(
            "Circular import detected: {}",
            path.display()
        )));
    }
    if import_stack.len() >= max_depth {
        let chain: Vec<String> = import_stack
            .iter()
            .map(|p| p.display().to_string())
            .chain(std::iter::once(path.display().to_string()))
            .collect();
        return Err(Error::recursion_limit(format!(
            "Maximum recursion depth ({max_depth}) exceeded. Import stack: {}",
            chain.join(" -> ")
        )));
    }
    Ok(())
}

/// Fail unless canonical `path` lies under canonical `root`.
pub fn ensure_contained(path: &Path, root: &Path) -> Result<()> {
    if path.starts_with(root) {
        Ok(())
    } else {
        Err(Error::invalid_path(format!(
            "{} resolves outside of {}",
            path.display(),
            root.display()
        )))
    }
}

/// Truthiness of a condition variable's value.
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| TRUTHY_VALUES.contains(&v.trim().to_lowercase().as_str()))
}
