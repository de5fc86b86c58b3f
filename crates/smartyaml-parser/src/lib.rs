//! # smartyaml-parser
//!
//! YAML parsing for the SmartYAML directive engine.
//!
//! This crate turns YAML text into a [`YamlNode`] tree that keeps what a
//! plain `yaml_rust2::Yaml` value throws away: the raw text and style of each
//! scalar, the tag on each node, and the source location of each node.
//! Directive tags such as `!import_yaml(base.yaml)` are kept verbatim for the
//! engine to interpret.
//!
//! It also provides the shared anchor namespace used across templates:
//! [`harvest_anchors`] collects a document's named anchors into an
//! [`AnchorTable`], and [`parse_with_anchors`] lets another document alias
//! them.
//!
//! ## Example
//!
//! ```rust
//! use smartyaml_parser::{parse_file, ScalarValue};
//!
//! let content = r#"
//! title: My Document
//! retries: 3
//! "#;
//!
//! let yaml = parse_file(content, "doc.yaml").unwrap();
//! let retries = yaml.get("retries").unwrap();
//! assert_eq!(retries.resolved_scalar(), Some(ScalarValue::Integer(3)));
//! assert_eq!(retries.source_info.line, 3);
//! ```

mod anchors;
mod error;
mod node;
mod parser;
mod scalar;
mod source_info;

pub use anchors::{AnchorTable, harvest_anchors, rewrite_shared_aliases};
pub use error::{Error, Result};
pub use node::{CORE_TAG_HANDLE, NodeKind, NodeTag, ScalarStyle, YamlHashEntry, YamlNode};
pub use parser::{SHARED_ALIAS_TAG, parse, parse_file, parse_with_anchors};
pub use scalar::{ScalarValue, resolve_plain_scalar};
pub use source_info::SourceInfo;
