//! In-flight values produced while a document is being evaluated.

use crate::value::Value;
use indexmap::IndexMap;
use smartyaml_parser::SourceInfo;

/// Mapping of in-flight values.
pub type DraftMapping = IndexMap<String, Draft>;

/// A value under construction.
///
/// Mirrors [`Value`] plus two markers that only exist until the load
/// finishes: an expansion waiting for variables, and an `!extend` payload
/// waiting for the value it appends to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Draft {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Draft>),
    Mapping(DraftMapping),

    /// `!expand` text with placeholders not yet resolvable.
    Deferred(DeferredExpansion),

    /// `!extend` payload; appended to the base sequence on merge.
    Extend(Vec<Draft>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferredExpansion {
    pub text: String,
    pub source_info: SourceInfo,
}

impl Draft {
    pub fn is_null(&self) -> bool {
        matches!(self, Draft::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Draft::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&DraftMapping> {
        match self {
            Draft::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut DraftMapping> {
        match self {
            Draft::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Draft::Null => "null",
            Draft::Bool(_) => "bool",
            Draft::Integer(_) => "integer",
            Draft::Float(_) => "float",
            Draft::String(_) => "string",
            Draft::Sequence(_) => "sequence",
            Draft::Mapping(_) => "mapping",
            Draft::Deferred(_) => "deferred expansion",
            Draft::Extend(_) => "extend marker",
        }
    }

    /// Scalar text for use as a directive argument or mapping key.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Draft::Null => Some(String::new()),
            Draft::Bool(b) => Some(b.to_string()),
            Draft::Integer(i) => Some(i.to_string()),
            Draft::Float(f) => Some(crate::value::format_float(*f)),
            Draft::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<Value> for Draft {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Draft::Null,
            Value::Bool(b) => Draft::Bool(b),
            Value::Integer(i) => Draft::Integer(i),
            Value::Float(f) => Draft::Float(f),
            Value::String(s) => Draft::String(s),
            Value::Sequence(items) => Draft::Sequence(items.into_iter().map(Draft::from).collect()),
            Value::Mapping(map) => {
                Draft::Mapping(map.into_iter().map(|(k, v)| (k, Draft::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Draft {
    fn from(s: &str) -> Self {
        Draft::String(s.to_string())
    }
}

impl From<String> for Draft {
    fn from(s: String) -> Self {
        Draft::String(s)
    }
}
