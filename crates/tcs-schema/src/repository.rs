//! # Schema Repository
//!
//! Process-scoped registry from schema name to schema document, shared by
//! reference between the validator, the composer and the engine adapter.
//!
//! ## Reference grammar
//!
//! - `name`: the whole document registered as `name`.
//! - `name#`: same.
//! - `name#/json/pointer`: a location inside the document.
//! - `name#anchor`: the sub-schema whose `id` is `#anchor`.
//!
//! Anchors are indexed when a document is registered, so resolution never
//! has to walk a document.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Keys whose values are instance data rather than sub-schemas.
const DATA_KEYWORDS: &[&str] = &["enum", "default"];

#[derive(Debug)]
struct Entry {
    document: Arc<Value>,
    /// Anchor name (without `#`) to JSON pointer.
    anchors: HashMap<String, String>,
}

/// A reference resolved against the repository.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Registered name of the containing document.
    pub base: String,
    /// The containing document.
    pub document: Arc<Value>,
    /// JSON pointer to the target inside `document`.
    pub pointer: String,
}

impl Resolved {
    /// The referenced sub-schema.
    pub fn value(&self) -> Option<&Value> {
        self.document.pointer(&self.pointer)
    }
}

/// Registry mapping schema names to schema documents.
///
/// Registration replaces any prior entry for the same name. Interior
/// locking lets every holder of an `Arc<SchemaRepository>` register and
/// resolve through `&self`.
#[derive(Debug, Default)]
pub struct SchemaRepository {
    entries: RwLock<HashMap<String, Entry>>,
}

/// Registered names never carry the empty trailing fragment.
fn normalize_name(name: &str) -> &str {
    name.trim_end_matches('#')
}

/// Split `name#fragment`; the fragment excludes the `#`.
fn split_reference(reference: &str) -> (&str, &str) {
    reference.split_once('#').unwrap_or((reference, ""))
}

fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn index_anchors(value: &Value, pointer: &str, anchors: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            if let Some(anchor) = map
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| id.strip_prefix('#'))
            {
                if !anchor.is_empty() && !anchor.starts_with('/') {
                    anchors
                        .entry(anchor.to_string())
                        .or_insert_with(|| pointer.to_string());
                }
            }
            for (key, child) in map {
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                let child_pointer = format!("{pointer}/{}", escape_pointer_segment(key));
                index_anchors(child, &child_pointer, anchors);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                index_anchors(child, &format!("{pointer}/{i}"), anchors);
            }
        }
        _ => {}
    }
}

impl SchemaRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `name`, replacing any prior entry.
    pub fn register(&self, name: &str, schema: Value) {
        let name = normalize_name(name).to_string();
        let mut anchors = HashMap::new();
        index_anchors(&schema, "", &mut anchors);
        tracing::debug!(
            schema = %name,
            anchors = anchors.len(),
            "registered schema"
        );
        self.entries.write().insert(
            name,
            Entry {
                document: Arc::new(schema),
                anchors,
            },
        );
    }

    /// Resolve an absolute reference.
    pub fn lookup(&self, reference: &str) -> Option<Resolved> {
        let (name, fragment) = split_reference(reference);
        let entries = self.entries.read();
        let entry = entries.get(normalize_name(name))?;
        let pointer = if fragment.is_empty() || fragment.starts_with('/') {
            fragment.to_string()
        } else {
            entry.anchors.get(fragment)?.clone()
        };
        let resolved = Resolved {
            base: normalize_name(name).to_string(),
            document: Arc::clone(&entry.document),
            pointer,
        };
        resolved.value()?;
        Some(resolved)
    }

    /// Resolve `reference`, treating a fragment-only reference (`#x`) as
    /// relative to the document registered as `base`.
    pub fn lookup_relative(&self, reference: &str, base: Option<&str>) -> Option<Resolved> {
        match (reference.strip_prefix('#'), base) {
            (Some(_), Some(base)) => self.lookup(&format!("{base}{reference}")),
            _ => self.lookup(reference),
        }
    }

    /// A copy of the sub-schema `reference` points at.
    pub fn resolve(&self, reference: &str) -> Option<Value> {
        self.lookup(reference)?.value().cloned()
    }

    /// Returns true if `reference` is non-empty and resolves.
    pub fn is_known(&self, reference: &str) -> bool {
        !reference.is_empty() && self.lookup(reference).is_some()
    }

    /// The whole document registered as `name`.
    pub fn document(&self, name: &str) -> Option<Arc<Value>> {
        self.entries
            .read()
            .get(normalize_name(name))
            .map(|entry| Arc::clone(&entry.document))
    }

    /// Every registered document, keyed by name. Documents are shared, not
    /// copied.
    pub fn snapshot(&self) -> HashMap<String, Arc<Value>> {
        self.entries
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(&entry.document)))
            .collect()
    }

    /// Registered names, sorted alphabetically.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
