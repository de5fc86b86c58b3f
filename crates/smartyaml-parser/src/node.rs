//! YAML node tree with tags, anchors and source location tracking.

use crate::SourceInfo;
use crate::scalar::{ScalarValue, resolve_plain_scalar};

/// Tag handle yaml-rust2 reports for `!!name` core tags.
pub const CORE_TAG_HANDLE: &str = "tag:yaml.org,2002:";

/// Presentation style of a scalar in the source text.
///
/// Only plain scalars go through implicit type resolution; every quoted or
/// block scalar is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A YAML tag attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTag {
    /// Tag handle (`!` for local tags, the core URI prefix for `!!` tags)
    pub handle: String,

    /// Tag suffix, e.g. `import_yaml(base.yaml)` for `!import_yaml(base.yaml)`
    pub suffix: String,

    /// Location of the tagged node
    pub source_info: SourceInfo,
}

impl NodeTag {
    /// Local tags (`!name`) are the ones directives are spelled with.
    pub fn is_local(&self) -> bool {
        self.handle == "!"
    }

    /// Core schema tags (`!!str`, `!!int`, ...).
    pub fn is_core(&self) -> bool {
        self.handle == CORE_TAG_HANDLE || self.handle == "!!"
    }
}

/// Structural payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A scalar with its raw (unresolved) text.
    Scalar { value: String, style: ScalarStyle },

    /// A sequence of nodes.
    Sequence(Vec<YamlNode>),

    /// A mapping, in document order. Duplicate keys are kept; consumers
    /// decide which entry wins.
    Mapping(Vec<YamlHashEntry>),
}

/// A YAML node with source location information.
///
/// Unlike a plain `Yaml` value this keeps everything the directive engine
/// needs: the raw scalar text, the tag and where the node came from.
/// Aliases are already expanded into clones of their anchored node.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub kind: NodeKind,

    /// Source location for this node.
    pub source_info: SourceInfo,

    /// Tag information, if the node carried one.
    pub tag: Option<NodeTag>,
}

/// A key-value pair in a YAML mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlHashEntry {
    pub key: YamlNode,
    pub value: YamlNode,
}

impl YamlNode {
    /// Create a scalar node.
    pub fn new_scalar(value: impl Into<String>, style: ScalarStyle, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Scalar {
                value: value.into(),
                style,
            },
            source_info,
            tag: None,
        }
    }

    /// Create a plain empty scalar (resolves to null).
    pub fn null(source_info: SourceInfo) -> Self {
        Self::new_scalar("", ScalarStyle::Plain, source_info)
    }

    /// Create a sequence node.
    pub fn new_sequence(items: Vec<YamlNode>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Sequence(items),
            source_info,
            tag: None,
        }
    }

    /// Create a mapping node.
    pub fn new_mapping(entries: Vec<YamlHashEntry>, source_info: SourceInfo) -> Self {
        Self {
            kind: NodeKind::Mapping(entries),
            source_info,
            tag: None,
        }
    }

    /// Attach a tag.
    pub fn with_tag(mut self, tag: Option<NodeTag>) -> Self {
        self.tag = tag;
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    /// Raw scalar text, if this is a scalar.
    pub fn as_scalar_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Get sequence items if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get mapping entries if this is a mapping.
    pub fn as_mapping(&self) -> Option<&[YamlHashEntry]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get a mapping value by key (string comparison, last entry wins).
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.as_mapping()?
            .iter()
            .rev()
            .find(|entry| entry.key.as_scalar_str() == Some(key))
            .map(|entry| &entry.value)
    }

    /// Resolve this scalar into a typed value.
    ///
    /// Plain scalars go through YAML 1.1 implicit typing, everything else is
    /// a string. A `!!str` tag forces a string as well.
    pub fn resolved_scalar(&self) -> Option<ScalarValue> {
        let NodeKind::Scalar { value, style } = &self.kind else {
            return None;
        };
        let forced_string = self
            .tag
            .as_ref()
            .is_some_and(|tag| tag.is_core() && tag.suffix == "str");
        if *style != ScalarStyle::Plain || forced_string {
            return Some(ScalarValue::String(value.clone()));
        }
        Some(resolve_plain_scalar(value))
    }

    /// Number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Scalar { .. } => 0,
            NodeKind::Sequence(items) => items.len(),
            NodeKind::Mapping(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short human-readable name of the node kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar { .. } => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }
}

impl YamlHashEntry {
    pub fn new(key: YamlNode, value: YamlNode) -> Self {
        Self { key, value }
    }
}
