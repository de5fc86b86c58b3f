//! SmartYAML: YAML with load-time directives.
//!
//! Documents are standard YAML plus local tags that are resolved while
//! loading:
//!
//! | Directive | Result |
//! |-----------|--------|
//! | `!import file` | the file's text |
//! | `!import_yaml file` | the parsed file, optionally merged with local overrides |
//! | `!template name` | `{template_path}/{name}.yaml`, like `!import_yaml` |
//! | `!include_if [COND, file]` | `!import` when env var `COND` is truthy, else null |
//! | `!include_yaml_if [COND, file]` | `!import_yaml` when `COND` is truthy, else null |
//! | `!env NAME` / `!env [NAME, default]` | an environment variable |
//! | `!base64 text` / `!base64_decode data` | base64 encoding and decoding |
//! | `!expand text` | `{{name}}` substitution from variables |
//! | `!extend [items]` | append to the inherited sequence instead of replacing it |
//!
//! Keys starting with `__` are metadata: `__vars` declares variables for
//! `!expand`, `__template` names a base mapping the document inherits from.
//! Metadata is stripped from the result by default.
//!
//! ```rust
//! use smartyaml::{LoadOptions, Value, loads};
//!
//! let doc = "
//! __vars:
//!   service: api
//! __template:
//!   replicas: 1
//!   tags: [base]
//! name: !expand '{{service}}-{{env}}'
//! tags: !extend [web]
//! ";
//! let options = LoadOptions::new().with_variable("env", "prod");
//! let value = loads(doc, &options).unwrap();
//!
//! assert_eq!(value.get("name"), Some(&Value::from("api-prod")));
//! assert_eq!(value.get("replicas"), Some(&Value::Integer(1)));
//! assert_eq!(
//!     value.get("tags"),
//!     Some(&Value::Sequence(vec![Value::from("base"), Value::from("web")]))
//! );
//! assert!(value.get("__vars").is_none());
//! ```
//!
//! New directives implement [`Directive`] and are registered on a
//! [`DirectiveRegistry`] passed to [`Loader::with_registry`].

pub mod context;
pub mod directive;
pub mod directives;
pub mod draft;
pub mod dump;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod merge;
pub mod options;
pub mod runtime;
pub mod validation;
pub mod value;
pub mod vars;

pub use context::{LoadContext, LoadState};
pub use directive::{Directive, DirectiveCall, DirectiveHandler, DirectiveRegistry};
pub use draft::{DeferredExpansion, Draft, DraftMapping};
pub use dump::{dump, dump_to_path};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use evaluator::Evaluator;
pub use loader::{Loader, load, loads, strip_metadata};
pub use merge::deep_merge;
pub use options::{
    DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_RECURSION_DEPTH, DumpOptions, LoadOptions,
    TEMPLATE_PATH_ENV, Variables,
};
pub use runtime::{NativeRuntime, SystemRuntime};
pub use value::{Mapping, Value};
pub use vars::VariablesMap;
