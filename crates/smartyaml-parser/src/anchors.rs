//! Anchors shared across documents.
//!
//! YAML anchors are scoped to a single document. To let a document alias an
//! anchor defined in a template it includes, the template's anchored nodes
//! are harvested into an [`AnchorTable`] up front, and the including
//! document's unresolved aliases are rewritten to a placeholder tag that the
//! parser resolves against the table.

use crate::YamlNode;
use crate::parser::{SHARED_ALIAS_TAG, parse_recording_anchors};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::HashSet;

/// Named anchors available to a document, in order of definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorTable {
    anchors: IndexMap<String, YamlNode>,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an anchor; a later definition of the same name wins.
    pub fn insert(&mut self, name: impl Into<String>, node: YamlNode) {
        self.anchors.insert(name.into(), node);
    }

    pub fn get(&self, name: &str) -> Option<&YamlNode> {
        self.anchors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.anchors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchor names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.anchors.keys().map(String::as_str)
    }

    /// Merge another table into this one; entries of `other` win.
    pub fn merge(&mut self, other: AnchorTable) {
        self.anchors.extend(other.anchors);
    }
}

/// Collect the named anchors a document defines.
///
/// Best effort: if the document does not parse, or its anchor properties
/// cannot be matched up with the parsed nodes, the table is empty.
pub fn harvest_anchors(content: &str, filename: Option<&str>) -> AnchorTable {
    let names: Vec<&str> = scan_anchor_refs(content)
        .into_iter()
        .filter(|r| r.kind == RefKind::Anchor)
        .map(|r| r.name)
        .collect();

    if names.is_empty() {
        return AnchorTable::new();
    }

    match parse_recording_anchors(content, filename) {
        Ok((_, nodes)) if nodes.len() == names.len() => {
            let mut table = AnchorTable::new();
            for (name, node) in names.into_iter().zip(nodes) {
                table.insert(name, node);
            }
            table
        }
        Ok((_, nodes)) => {
            tracing::debug!(
                file = filename.unwrap_or("<string>"),
                scanned = names.len(),
                parsed = nodes.len(),
                "anchor harvest skipped: anchor count mismatch"
            );
            AnchorTable::new()
        }
        Err(err) => {
            tracing::debug!(
                file = filename.unwrap_or("<string>"),
                error = %err,
                "anchor harvest skipped: document does not parse"
            );
            AnchorTable::new()
        }
    }
}

/// Rewrite aliases that refer to shared anchors into placeholder tags.
///
/// An alias is rewritten only when its anchor is in `table` and was not
/// defined earlier in `content` itself.
pub fn rewrite_shared_aliases<'a>(content: &'a str, table: &AnchorTable) -> Cow<'a, str> {
    let mut defined: HashSet<&str> = HashSet::new();
    let mut out = String::new();
    let mut last = 0;

    for r in scan_anchor_refs(content) {
        match r.kind {
            RefKind::Anchor => {
                defined.insert(r.name);
            }
            RefKind::Alias if !defined.contains(r.name) && table.contains(r.name) => {
                out.push_str(&content[last..r.start]);
                out.push('!');
                out.push_str(SHARED_ALIAS_TAG);
                out.push(' ');
                out.push_str(r.name);
                last = r.end;
            }
            RefKind::Alias => {}
        }
    }

    if last == 0 {
        return Cow::Borrowed(content);
    }
    out.push_str(&content[last..]);
    Cow::Owned(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Anchor,
    Alias,
}

/// An `&name` or `*name` token; `start..end` spans the sigil and the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnchorRef<'a> {
    kind: RefKind,
    name: &'a str,
    start: usize,
    end: usize,
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Rest of a line after `|` or `>`: chomping/indent indicators, then
/// nothing but an optional comment.
fn is_block_header(rest: &str) -> bool {
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == '+' || c == '-');
    let rest = rest.trim();
    rest.is_empty() || rest.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Find anchor and alias tokens, skipping comments, quoted scalars and
/// block scalar bodies.
///
/// A `&` or `*` only counts where a node can start: at the start of a
/// block line, after `- `, `? ` or `: `, after a tag or anchor, and after
/// `[`, `{` or `,` in flow context. Inside a plain scalar it is text.
fn scan_anchor_refs(content: &str) -> Vec<AnchorRef<'_>> {
    let mut refs = Vec::new();
    let mut quote: Option<char> = None;
    let mut flow_depth = 0usize;
    let mut block_parent_indent: Option<usize> = None;
    let mut node_start = true;
    let mut line_start = 0;

    for line in content.split_inclusive('\n') {
        let offset = line_start;
        line_start += line.len();

        if let Some(parent) = block_parent_indent {
            if line.trim().is_empty() || indent_of(line) > parent {
                continue;
            }
            block_parent_indent = None;
        }
        if flow_depth == 0 && quote.is_none() {
            node_start = true;
        }

        let mut prev: Option<char> = None;
        let mut chars = line.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                if q == '"' && c == '\\' {
                    chars.next();
                } else if c == q {
                    if q == '\'' && chars.peek().is_some_and(|(_, n)| *n == '\'') {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
                prev = Some(c);
                continue;
            }
            if c.is_whitespace() {
                prev = Some(c);
                continue;
            }

            let next = chars.peek().map(|&(_, n)| n);
            let separated = next.is_none_or(char::is_whitespace);
            match c {
                '#' if prev.is_none_or(char::is_whitespace) => break,
                ':' if separated || (flow_depth > 0 && next.is_some_and(is_flow_indicator)) => {
                    node_start = true;
                }
                '-' | '?' if node_start && separated => {}
                ',' if flow_depth > 0 => node_start = true,
                '[' | '{' if node_start => flow_depth += 1,
                ']' | '}' if flow_depth > 0 => {
                    flow_depth -= 1;
                    node_start = false;
                }
                '\'' | '"' if node_start => {
                    quote = Some(c);
                    node_start = false;
                }
                '|' | '>'
                    if node_start && flow_depth == 0 && is_block_header(&line[i + 1..]) =>
                {
                    block_parent_indent = Some(indent_of(line));
                    break;
                }
                '!' if node_start => {
                    while chars
                        .next_if(|&(_, n)| {
                            !n.is_whitespace() && !(flow_depth > 0 && is_flow_indicator(n))
                        })
                        .is_some()
                    {}
                }
                '&' | '*' if node_start => {
                    let name_start = i + c.len_utf8();
                    let mut name_end = name_start;
                    while let Some((j, n)) =
                        chars.next_if(|&(_, n)| !n.is_whitespace() && !is_flow_indicator(n))
                    {
                        name_end = j + n.len_utf8();
                    }
                    if name_end > name_start {
                        refs.push(AnchorRef {
                            kind: if c == '&' {
                                RefKind::Anchor
                            } else {
                                RefKind::Alias
                            },
                            name: &line[name_start..name_end],
                            start: offset + i,
                            end: offset + name_end,
                        });
                    }
                    // An anchor precedes its node; an alias is the node.
                    node_start = c == '&';
                }
                _ => node_start = false,
            }
            prev = Some(c);
        }
    }

    refs
}
