//! Per-parse context and the per-load accumulator.

use crate::error::{Error, Result};
use crate::options::{IMPORT_CHAIN_DISPLAY_LEN, LoadOptions, TEMPLATE_PATH_ENV};
use crate::runtime::SystemRuntime;
use crate::vars::{VariablesMap, expand_variables_recursively, stringify_variables};
use smartyaml_parser::AnchorTable;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a directive needs to know about where it is being evaluated.
///
/// Immutable once built; nested parses get a [`child`](LoadContext::child).
#[derive(Clone)]
pub struct LoadContext {
    /// Directory relative paths resolve against
    pub base_path: PathBuf,

    /// Configured template root, if any (not yet validated)
    pub template_root: Option<PathBuf>,

    /// Canonical paths of the files being loaded, outermost first
    pub import_stack: Vec<PathBuf>,

    pub max_file_size: u64,

    pub max_recursion_depth: usize,

    /// Caller variables in text form, already expanded
    pub caller_variables: Arc<VariablesMap>,

    pub runtime: Arc<dyn SystemRuntime>,
}

impl LoadContext {
    /// Build the top-level context for a load.
    ///
    /// The template root comes from the options, or from `SMARTYAML_TMPL`
    /// as seen by the options' runtime.
    pub fn from_options(options: &LoadOptions, base_path: PathBuf) -> Self {
        let template_root = options.template_path.clone().or_else(|| {
            options
                .runtime
                .env_var(TEMPLATE_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        Self {
            base_path,
            template_root,
            import_stack: Vec::new(),
            max_file_size: options.max_file_size,
            max_recursion_depth: options.max_recursion_depth,
            caller_variables: Arc::new(expand_variables_recursively(stringify_variables(
                &options.variables,
            ))),
            runtime: Arc::clone(&options.runtime),
        }
    }

    /// Context for parsing `path`, whose relative references resolve against
    /// `base_path`.
    pub fn child(&self, path: PathBuf, base_path: PathBuf) -> Self {
        let mut child = self.clone();
        child.import_stack.push(path);
        child.base_path = base_path;
        child
    }

    /// Resolve `filename` against the base path and canonicalize it.
    pub fn resolve_existing(&self, filename: &str) -> Result<PathBuf> {
        self.canonicalize(&self.base_path.join(filename))
    }

    /// Canonical form of an existing path.
    pub fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.runtime
            .canonicalize(path)
            .map_err(|err| io_error(path, err))
    }

    /// The validated, canonical template root.
    pub fn template_root(&self) -> Result<PathBuf> {
        let Some(root) = &self.template_root else {
            return Err(Error::template_path(format!(
                "Template path not configured. Set `template_path` or the {TEMPLATE_PATH_ENV} environment variable"
            )));
        };
        if !self.runtime.is_dir(root) {
            return Err(Error::template_path(format!(
                "Template path does not exist: {}",
                root.display()
            )));
        }
        self.canonicalize(root)
    }

    /// Read a file, enforcing the size limit before reading.
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let size = self.runtime.file_size(path).map_err(|err| io_error(path, err))?;
        if size > self.max_file_size {
            return Err(Error::resource_limit(format!(
                "{} is {size} bytes, larger than the {} byte limit",
                path.display(),
                self.max_file_size
            )));
        }
        self.runtime
            .read_to_string(path)
            .map_err(|err| io_error(path, err))
    }

    /// The last few entries of the import stack, for error messages.
    pub fn import_chain_tail(&self) -> Vec<String> {
        let start = self
            .import_stack
            .len()
            .saturating_sub(IMPORT_CHAIN_DISPLAY_LEN);
        self.import_stack[start..]
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    /// The file currently being evaluated, if any.
    pub fn current_file(&self) -> Option<&Path> {
        self.import_stack.last().map(PathBuf::as_path)
    }
}

fn io_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

/// State accumulated across every file of one top-level load.
#[derive(Debug, Default)]
pub struct LoadState {
    /// Variables from `__vars` blocks, in load completion order
    pub variables: VariablesMap,

    /// Anchors harvested from referenced templates
    pub anchors: AnchorTable,
}

impl LoadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished document's variables; later documents win.
    pub fn accumulate_variables(&mut self, variables: VariablesMap) {
        for (name, value) in variables {
            self.variables.insert(name, value);
        }
    }
}
