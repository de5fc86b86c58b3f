//! Load and dump configuration.

use crate::runtime::{NativeRuntime, SystemRuntime};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable consulted when no template path is configured.
pub const TEMPLATE_PATH_ENV: &str = "SMARTYAML_TMPL";

/// Default upper bound on the size of any file read (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default upper bound on nested imports.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 10;

/// Values of a condition variable that enable `!include_if`.
pub const TRUTHY_VALUES: [&str; 5] = ["true", "1", "yes", "on", "enabled"];

/// Number of trailing import chain entries shown in error context.
pub const IMPORT_CHAIN_DISPLAY_LEN: usize = 3;

/// Passes made when expanding variables that reference other variables.
pub const MAX_VARIABLE_EXPANSION_PASSES: usize = 10;

/// Prefix marking metadata keys.
pub const METADATA_PREFIX: &str = "__";

/// Key holding a document's variables.
pub const VARS_KEY: &str = "__vars";

/// Key holding a document's inherited base.
pub const TEMPLATE_KEY: &str = "__template";

/// Caller-supplied variables, by name.
pub type Variables = IndexMap<String, Value>;

/// Options controlling a load.
///
/// ```rust
/// use smartyaml::LoadOptions;
///
/// let options = LoadOptions::new()
///     .with_base_path("config")
///     .with_variable("env", "prod")
///     .with_max_recursion_depth(5);
/// assert_eq!(options.max_recursion_depth, 5);
/// ```
#[derive(Clone)]
pub struct LoadOptions {
    /// Directory relative paths resolve against. Defaults to the loaded
    /// file's directory, or the current directory for strings.
    pub base_path: Option<PathBuf>,

    /// Root directory for `!template`. Falls back to `SMARTYAML_TMPL`.
    pub template_path: Option<PathBuf>,

    pub max_file_size: u64,

    pub max_recursion_depth: usize,

    /// Strip `__`-prefixed keys from the result.
    pub remove_metadata: bool,

    /// Variables for `!expand`; these take precedence over `__vars`.
    pub variables: Variables,

    pub runtime: Arc<dyn SystemRuntime>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_template_path(mut self, template_path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(template_path.into());
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_max_recursion_depth(mut self, max_recursion_depth: usize) -> Self {
        self.max_recursion_depth = max_recursion_depth;
        self
    }

    pub fn with_remove_metadata(mut self, remove_metadata: bool) -> Self {
        self.remove_metadata = remove_metadata;
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn SystemRuntime>) -> Self {
        self.runtime = runtime;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            template_path: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            remove_metadata: true,
            variables: Variables::new(),
            runtime: Arc::new(NativeRuntime::new()),
        }
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("base_path", &self.base_path)
            .field("template_path", &self.template_path)
            .field("max_file_size", &self.max_file_size)
            .field("max_recursion_depth", &self.max_recursion_depth)
            .field("remove_metadata", &self.remove_metadata)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

/// Options controlling YAML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Emit multi-line strings as literal blocks.
    pub multiline_strings: bool,

    /// Emit nested collections in compact form.
    pub compact: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            multiline_strings: false,
            compact: true,
        }
    }
}
