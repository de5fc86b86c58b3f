/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Load orchestration: read, evaluate, resolve variables, strip metadata.
 */

//! Load orchestration.
//!
//! A load runs in four stages:
//!
//! 1. Read the source (size-limited) and work out the base path
//! 2. Evaluate the document, recursing into imported files; every file's
//!    `__vars` land in the shared [`LoadState`]
//! 3. Merge discovered variables with the caller's (caller wins), expand
//!    them, and resolve every deferred `!expand`
//! 4. Strip `__`-prefixed metadata keys, unless asked not to

use crate::context::{LoadContext, LoadState};
use crate::directive::DirectiveRegistry;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::options::{LoadOptions, METADATA_PREFIX};
use crate::value::Value;
use crate::vars::{expand_variables_recursively, merge_variables, resolve_deferred};
use std::path::{Path, PathBuf};

/// Loads SmartYAML documents with a given set of directives.
///
/// ```rust
/// use smartyaml::{LoadOptions, Loader, Value};
///
/// let loader = Loader::new();
/// let value = loader
///     .loads("greeting: !expand 'Hello {{name}}'\n", &LoadOptions::new().with_variable("name", "World"))
///     .unwrap();
/// assert_eq!(value.get("greeting"), Some(&Value::from("Hello World")));
/// ```
#[derive(Default)]
pub struct Loader {
    registry: DirectiveRegistry,
}

impl Loader {
    /// A loader with the built-in directives.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: DirectiveRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DirectiveRegistry {
        &mut self.registry
    }

    /// Load a file. Relative references resolve against the file's
    /// directory unless `options.base_path` says otherwise.
    pub fn load(&self, path: impl AsRef<Path>, options: &LoadOptions) -> Result<Value> {
        let path = path.as_ref();
        let reader = LoadContext::from_options(options, PathBuf::new());
        let canonical = reader.canonicalize(path)?;
        let content = reader.read_file(&canonical)?;

        let base_path = match &options.base_path {
            Some(base) => base.clone(),
            None => canonical
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf),
        };
        let source_name = canonical.display().to_string();

        let value = self.run(&content, Some(&source_name), base_path, options)?;
        tracing::debug!(path = %canonical.display(), "loaded document");
        Ok(value)
    }

    /// Load a document from a string. Relative references resolve against
    /// the current directory unless `options.base_path` says otherwise.
    pub fn loads(&self, content: &str, options: &LoadOptions) -> Result<Value> {
        let base_path = match &options.base_path {
            Some(base) => base.clone(),
            None => options
                .runtime
                .current_dir()
                .map_err(|source| Error::Io {
                    path: PathBuf::from("."),
                    source,
                })?,
        };
        self.run(content, None, base_path, options)
    }

    fn run(
        &self,
        content: &str,
        source_name: Option<&str>,
        base_path: PathBuf,
        options: &LoadOptions,
    ) -> Result<Value> {
        let ctx = LoadContext::from_options(options, base_path);
        let mut state = LoadState::new();
        let draft = Evaluator::new(&self.registry, &mut state).evaluate_document(
            content,
            source_name,
            &ctx,
        )?;

        let variables = expand_variables_recursively(merge_variables(
            &state.variables,
            &ctx.caller_variables,
        ));
        let value = resolve_deferred(draft, &variables, &ctx)?;

        if options.remove_metadata {
            Ok(strip_metadata(value))
        } else {
            Ok(value)
        }
    }
}

/// Load a file with the built-in directives.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Value> {
    Loader::new().load(path, options)
}

/// Load a string with the built-in directives.
pub fn loads(content: &str, options: &LoadOptions) -> Result<Value> {
    Loader::new().loads(content, options)
}

/// Remove every `__`-prefixed key, at any depth.
pub fn strip_metadata(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .filter(|(key, _)| !key.starts_with(METADATA_PREFIX))
                .map(|(key, value)| (key, strip_metadata(value)))
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(strip_metadata).collect()),
        other => other,
    }
}
