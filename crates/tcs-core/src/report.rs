//! # Validation Error Model
//!
//! [`ValidationError`] is the single node type of every diagnostic tree:
//! engine failures after cleaning, context layers added while composing or
//! validating, and parents built from sibling failures by [`add_error`].
//!
//! Nodes are built once and handed out by value; nothing in the toolkit
//! mutates a tree after it has been returned to a caller.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// A hierarchical validation diagnostic.
///
/// Optional fields are `None` for nodes that do not carry them (context
/// layers built by [`add_error`] only have a `message`). Serializes with the
/// camelCase field names used in printed reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Human-readable description.
    pub message: String,
    /// JSON Pointer into the instance; `"/"` for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    /// JSON Pointer into the schema as reported by the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
    /// `schema_path` rebased onto the nearest `$ref`/`id` anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_relative_path: Option<String>,
    /// Errno-style code for filesystem failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// File the failure relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fpath: Option<String>,
    /// Suggested fix, e.g. `{ "id": { "is": ..., "should_be": ... } }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Value>,
    /// Diagnostic payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Ordered child failures; empty for a leaf.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_errors: Vec<ValidationError>,
}

impl ValidationError {
    /// A leaf carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.sub_errors.is_empty()
    }

    /// Returns true if any field besides `message` and `sub_errors` is set.
    pub fn has_extra_fields(&self) -> bool {
        self.data_path.is_some()
            || self.schema_path.is_some()
            || self.schema_relative_path.is_some()
            || self.code.is_some()
            || self.fpath.is_some()
            || self.suggestion.is_some()
            || self.data.is_some()
    }

    /// Shallow copy of every populated field except `sub_errors`, in
    /// serialization order.
    pub fn head_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("message".to_string(), Value::String(self.message.clone()));
        let strings = [
            ("dataPath", &self.data_path),
            ("schemaPath", &self.schema_path),
            ("schemaRelativePath", &self.schema_relative_path),
            ("code", &self.code),
            ("fpath", &self.fpath),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        if let Some(v) = &self.suggestion {
            map.insert("suggestion".to_string(), v.clone());
        }
        if let Some(v) = &self.data {
            map.insert("data".to_string(), v.clone());
        }
        map
    }

    /// Total number of nodes in the tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.sub_errors.iter().map(Self::node_count).sum::<usize>()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// One input to [`add_error`]: a node, or a batch of nodes collected by the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorItem {
    /// A single failure.
    Single(ValidationError),
    /// A sequence of sibling failures.
    Many(Vec<ValidationError>),
}

impl From<ValidationError> for ErrorItem {
    fn from(err: ValidationError) -> Self {
        Self::Single(err)
    }
}

impl From<&SchemaError> for ErrorItem {
    fn from(err: &SchemaError) -> Self {
        Self::Single(err.to_report())
    }
}

impl From<SchemaError> for ErrorItem {
    fn from(err: SchemaError) -> Self {
        Self::Single(err.to_report())
    }
}

impl From<Vec<ValidationError>> for ErrorItem {
    fn from(errs: Vec<ValidationError>) -> Self {
        Self::Many(errs)
    }
}

impl From<Vec<SchemaError>> for ErrorItem {
    fn from(errs: Vec<SchemaError>) -> Self {
        Self::Many(errs.iter().map(SchemaError::to_report).collect())
    }
}

/// Build a parent node with `message` whose children are `sub_errors`.
///
/// - No inputs: the result is a leaf.
/// - A single input that is itself a sequence: that sequence becomes the
///   children directly instead of being wrapped again.
/// - Sequences among several inputs are spliced in place.
pub fn add_error(sub_errors: Vec<ErrorItem>, message: impl Into<String>) -> ValidationError {
    let mut parent = ValidationError::new(message);
    parent.sub_errors = sub_errors
        .into_iter()
        .flat_map(|item| match item {
            ErrorItem::Single(err) => vec![err],
            ErrorItem::Many(errs) => errs,
        })
        .collect();
    parent
}
