//! YAML parser that builds `YamlNode` trees.

use crate::anchors::{AnchorTable, rewrite_shared_aliases};
use crate::node::{NodeTag, ScalarStyle, YamlHashEntry, YamlNode};
use crate::{Error, Result, SourceInfo};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Local tag the alias rewriter puts on references to shared anchors.
///
/// `*name` becomes `!__smartyaml_alias name`, which the builder swaps for a
/// clone of the shared anchor's node.
pub const SHARED_ALIAS_TAG: &str = "__smartyaml_alias";

/// Parse YAML from a string, producing a `YamlNode` tree.
///
/// Only the first document of a stream is parsed. An empty document (or one
/// containing only comments) parses to a null scalar.
///
/// # Example
///
/// ```rust
/// use smartyaml_parser::parse;
///
/// let yaml = parse("title: My Document").unwrap();
/// assert!(yaml.is_mapping());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid.
pub fn parse(content: &str) -> Result<YamlNode> {
    parse_impl(content, None, None).map(|(root, _)| root)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is recorded in every node's source location.
///
/// ```rust
/// use smartyaml_parser::parse_file;
///
/// let yaml = parse_file("title: Test", "config.yaml").unwrap();
/// assert_eq!(yaml.source_info.file, Some("config.yaml".into()));
/// ```
pub fn parse_file(content: &str, filename: &str) -> Result<YamlNode> {
    parse_impl(content, Some(filename), None).map(|(root, _)| root)
}

/// Parse YAML whose aliases may refer to anchors defined in other documents.
///
/// Aliases that are not defined earlier in `content` but are present in
/// `anchors` resolve to a clone of the shared node. With an empty table
/// this is the same as [`parse`].
pub fn parse_with_anchors(
    content: &str,
    filename: Option<&str>,
    anchors: &AnchorTable,
) -> Result<YamlNode> {
    if anchors.is_empty() {
        return parse_impl(content, filename, None).map(|(root, _)| root);
    }
    let rewritten = rewrite_shared_aliases(content, anchors);
    parse_impl(&rewritten, filename, Some(anchors)).map(|(root, _)| root)
}

/// Parse and also return every anchored node, in order of anchor appearance.
pub(crate) fn parse_recording_anchors(
    content: &str,
    filename: Option<&str>,
) -> Result<(YamlNode, Vec<YamlNode>)> {
    parse_impl(content, filename, None)
}

fn parse_impl(
    content: &str,
    filename: Option<&str>,
    shared: Option<&AnchorTable>,
) -> Result<(YamlNode, Vec<YamlNode>)> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::new(filename, shared);

    parser
        .load(&mut builder, false) // false = single document only
        .map_err(|err| Error::from(err).in_file(filename))?;

    builder.result()
}

/// Builder that implements MarkedEventReceiver to construct a `YamlNode`.
struct YamlBuilder<'a> {
    /// Optional filename for source info
    filename: Option<String>,

    /// Stack of nodes being constructed
    stack: Vec<BuildNode>,

    /// The completed root node
    root: Option<YamlNode>,

    /// Completed anchored nodes by anchor id
    anchors: HashMap<usize, YamlNode>,

    /// Anchors shared from other documents
    shared: Option<&'a AnchorTable>,

    /// First error seen; later events are ignored
    error: Option<Error>,
}

/// A node being constructed during parsing.
enum BuildNode {
    Sequence {
        start_marker: Marker,
        anchor_id: usize,
        tag: Option<Tag>,
        items: Vec<YamlNode>,
    },

    Mapping {
        start_marker: Marker,
        anchor_id: usize,
        tag: Option<Tag>,
        entries: Vec<(YamlNode, Option<YamlNode>)>,
    },
}

impl<'a> YamlBuilder<'a> {
    fn new(filename: Option<&str>, shared: Option<&'a AnchorTable>) -> Self {
        Self {
            filename: filename.map(|s| s.to_string()),
            stack: Vec::new(),
            root: None,
            anchors: HashMap::new(),
            shared,
            error: None,
        }
    }

    fn result(self) -> Result<(YamlNode, Vec<YamlNode>)> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.stack.is_empty() {
            return Err(Error::InvalidStructure {
                message: "unterminated collection".into(),
                location: None,
            }
            .in_file(self.filename.as_deref()));
        }

        let root = match self.root {
            Some(root) => root,
            None => {
                let mut info = SourceInfo::default();
                if let Some(filename) = &self.filename {
                    info = info.with_file(filename.clone());
                }
                YamlNode::null(info)
            }
        };

        let mut anchored: Vec<(usize, YamlNode)> = self.anchors.into_iter().collect();
        anchored.sort_by_key(|(id, _)| *id);
        Ok((root, anchored.into_iter().map(|(_, node)| node).collect()))
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err.in_file(self.filename.as_deref()));
        }
    }

    fn push_complete(&mut self, node: YamlNode, anchor_id: usize) {
        if anchor_id != 0 {
            self.anchors.insert(anchor_id, node.clone());
        }

        let Some(parent) = self.stack.last_mut() else {
            // First complete node with an empty stack is the root; a second
            // document is never loaded.
            if self.root.is_none() {
                self.root = Some(node);
            }
            return;
        };

        match parent {
            BuildNode::Sequence { items, .. } => items.push(node),
            BuildNode::Mapping { entries, .. } => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }

    fn make_source_info(&self, marker: &Marker, len: usize) -> SourceInfo {
        let mut info = SourceInfo::from_marker(marker, len);
        if let Some(ref filename) = self.filename {
            info = info.with_file(filename.clone());
        }
        info
    }

    fn make_tag(&self, tag: Option<Tag>, source_info: &SourceInfo) -> Option<NodeTag> {
        tag.map(|tag| NodeTag {
            handle: tag.handle,
            suffix: tag.suffix,
            source_info: source_info.clone(),
        })
    }

    fn on_scalar(
        &mut self,
        value: String,
        style: TScalarStyle,
        anchor_id: usize,
        tag: Option<Tag>,
        marker: Marker,
    ) {
        let source_info = self.make_source_info(&marker, value.chars().count());

        let is_shared_alias = tag
            .as_ref()
            .is_some_and(|t| t.handle == "!" && t.suffix == SHARED_ALIAS_TAG);
        if is_shared_alias {
            match self.shared.and_then(|table| table.get(&value)) {
                Some(shared) => {
                    let node = shared.clone();
                    self.push_complete(node, anchor_id);
                }
                None => self.fail(Error::UnknownAnchor {
                    name: value,
                    location: Some(source_info),
                }),
            }
            return;
        }

        let style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            TScalarStyle::Folded => ScalarStyle::Folded,
            _ => ScalarStyle::Plain,
        };
        let tag = self.make_tag(tag, &source_info);
        let node = YamlNode::new_scalar(value, style, source_info).with_tag(tag);
        self.push_complete(node, anchor_id);
    }

    fn on_sequence_end(&mut self, marker: Marker) {
        match self.stack.pop() {
            Some(BuildNode::Sequence {
                start_marker,
                anchor_id,
                tag,
                items,
            }) => {
                let len = marker.index().saturating_sub(start_marker.index());
                let source_info = self.make_source_info(&start_marker, len);
                let tag = self.make_tag(tag, &source_info);
                let node = YamlNode::new_sequence(items, source_info).with_tag(tag);
                self.push_complete(node, anchor_id);
            }
            _ => self.fail(Error::InvalidStructure {
                message: "sequence end without matching start".into(),
                location: Some(SourceInfo::from_marker(&marker, 0)),
            }),
        }
    }

    fn on_mapping_end(&mut self, marker: Marker) {
        match self.stack.pop() {
            Some(BuildNode::Mapping {
                start_marker,
                anchor_id,
                tag,
                entries,
            }) => {
                let len = marker.index().saturating_sub(start_marker.index());
                let source_info = self.make_source_info(&start_marker, len);

                let mut hash_entries = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let Some(value) = value else {
                        self.fail(Error::InvalidStructure {
                            message: "mapping entry without value".into(),
                            location: Some(key.source_info),
                        });
                        return;
                    };
                    hash_entries.push(YamlHashEntry::new(key, value));
                }

                let tag = self.make_tag(tag, &source_info);
                let node = YamlNode::new_mapping(hash_entries, source_info).with_tag(tag);
                self.push_complete(node, anchor_id);
            }
            _ => self.fail(Error::InvalidStructure {
                message: "mapping end without matching start".into(),
                location: Some(SourceInfo::from_marker(&marker, 0)),
            }),
        }
    }
}

impl MarkedEventReceiver for YamlBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }

        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                self.on_scalar(value, style, anchor_id, tag, marker);
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Sequence {
                    start_marker: marker,
                    anchor_id,
                    tag,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => self.on_sequence_end(marker),

            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Mapping {
                    start_marker: marker,
                    anchor_id,
                    tag,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => self.on_mapping_end(marker),

            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id) {
                Some(node) => {
                    let node = node.clone();
                    self.push_complete(node, 0);
                }
                None => {
                    let location = self.make_source_info(&marker, 0);
                    self.fail(Error::UnknownAnchor {
                        name: format!("#{anchor_id}"),
                        location: Some(location),
                    });
                }
            },
        }
    }
}
