//! # Schema-Relative Paths
//!
//! Turns the raw schema pointer reported for a failure into a path anchored
//! at the nearest `$ref` or `id`. Paths reached through fragment ids come
//! out as `#statement/properties/verb` instead of a long pointer from the
//! composite root.
//!
//! The walk dereferences `$ref`s through the [`SchemaRepository`]. Each
//! chain of `$ref` hops keeps its own visited set and stops at a cycle;
//! recursive schemas are re-entered once per path segment.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::repository::SchemaRepository;

/// Marker appended when a path segment does not exist in the schema.
pub const NOT_APPLICABLE: &str = "<N/A>";

/// Where the walk currently is: a document and a pointer into it.
struct Cursor {
    base: Option<String>,
    document: Arc<Value>,
    pointer: String,
}

impl Cursor {
    fn value(&self) -> Option<&Value> {
        self.document.pointer(&self.pointer)
    }

    fn location(&self) -> String {
        format!("{}#{}", self.base.as_deref().unwrap_or_default(), self.pointer)
    }
}

/// Computes schema-relative paths against a repository.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    repo: &'a SchemaRepository,
}

impl<'a> PathResolver<'a> {
    /// A resolver dereferencing through `repo`.
    pub fn new(repo: &'a SchemaRepository) -> Self {
        Self { repo }
    }

    /// Rebase `raw_path` (a JSON pointer into `schema`) onto the nearest
    /// `$ref`/`id` anchor.
    ///
    /// Each segment is appended to the result; whenever the schema reached
    /// carries a string `id`, the result restarts from that id. A segment
    /// that does not exist appends [`NOT_APPLICABLE`] and ends the walk.
    pub fn relativize(&self, raw_path: Option<&str>, schema: &Value) -> String {
        let mut relative = String::new();

        let mut cursor = match schema.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                relative.push_str(reference);
                match self.repo.lookup(reference) {
                    Some(resolved) => Cursor {
                        base: Some(resolved.base),
                        document: resolved.document,
                        pointer: resolved.pointer,
                    },
                    None => Cursor {
                        base: None,
                        document: Arc::new(schema.clone()),
                        pointer: String::new(),
                    },
                }
            }
            None => Cursor {
                base: schema
                    .get("id")
                    .and_then(Value::as_str)
                    .filter(|id| !id.starts_with('#'))
                    .map(|id| id.trim_end_matches('#').to_string()),
                document: Arc::new(schema.clone()),
                pointer: String::new(),
            },
        };

        for segment in raw_path.unwrap_or_default().split('/') {
            if segment.is_empty() {
                continue;
            }
            relative.push('/');
            relative.push_str(segment);

            let next = format!("{}/{}", cursor.pointer, segment);
            if cursor.document.pointer(&next).is_none() {
                relative.push_str(NOT_APPLICABLE);
                return relative;
            }
            cursor.pointer = next;

            self.follow_refs(&mut cursor);

            if let Some(id) = cursor.value().and_then(|v| v.get("id")).and_then(Value::as_str) {
                relative = id.to_string();
            }
        }

        if relative.is_empty() {
            relative.push('/');
        }
        relative
    }

    /// Move the cursor through one chain of `$ref`s. Stops on an
    /// unresolvable reference or one already visited in this chain.
    fn follow_refs(&self, cursor: &mut Cursor) {
        let mut visited = HashSet::from([cursor.location()]);
        while let Some(reference) = cursor
            .value()
            .and_then(|v| v.get("$ref"))
            .and_then(Value::as_str)
            .map(str::to_string)
        {
            let Some(resolved) = self.repo.lookup_relative(&reference, cursor.base.as_deref()) else {
                tracing::trace!(%reference, "unresolvable $ref while relativizing");
                return;
            };
            let location = format!("{}#{}", resolved.base, resolved.pointer);
            if !visited.insert(location) {
                tracing::trace!(%reference, "$ref cycle while relativizing");
                return;
            }
            *cursor = Cursor {
                base: Some(resolved.base),
                document: resolved.document,
                pointer: resolved.pointer,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo() -> SchemaRepository {
        let repo = SchemaRepository::new();
        repo.register(
            "tcapi:1.0.1",
            json!({
                "type": "object",
                "properties": {
                    "agent": {
                        "id": "#agent",
                        "type": "object",
                        "properties": {"mbox": {"type": "string", "format": "mbox"}}
                    },
                    "statement": {
                        "id": "#statement",
                        "type": "object",
                        "required": ["actor", "verb"],
                        "properties": {
                            "actor": {"$ref": "#agent"},
                            "context": {
                                "type": "object",
                                "properties": {"extensions": {"type": "object"}}
                            }
                        }
                    },
                    "loop_a": {"$ref": "#/properties/loop_b"},
                    "loop_b": {"$ref": "#/properties/loop_a"}
                }
            }),
        );
        repo
    }

    #[test]
    fn empty_path_on_plain_schema_is_root() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        assert_eq!(resolver.relativize(None, &json!({"type": "object"})), "/");
        assert_eq!(resolver.relativize(Some(""), &json!({"type": "object"})), "/");
    }

    #[test]
    fn ref_seeds_the_path() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1#statement"});
        assert_eq!(resolver.relativize(Some(""), &schema), "tcapi:1.0.1#statement");
        assert_eq!(
            resolver.relativize(Some("/required"), &schema),
            "tcapi:1.0.1#statement/required"
        );
    }

    #[test]
    fn ids_rebase_the_path() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1#statement"});
        assert_eq!(
            resolver.relativize(Some("/properties/actor"), &schema),
            "#agent"
        );
        assert_eq!(
            resolver.relativize(Some("/properties/actor/properties/mbox/format"), &schema),
            "#agent/properties/mbox/format"
        );
    }

    #[test]
    fn rebasing_from_the_composite_root() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1"});
        assert_eq!(
            resolver.relativize(Some("/properties/statement/properties/context/type"), &schema),
            "#statement/properties/context/type"
        );
    }

    #[test]
    fn missing_key_stops_with_marker_and_keeps_prefix() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1#statement"});
        assert_eq!(
            resolver.relativize(Some("/properties/context/nope/further/segments"), &schema),
            "tcapi:1.0.1#statement/properties/context/nope<N/A>"
        );
    }

    #[test]
    fn array_indices_are_segments() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1#statement"});
        assert_eq!(
            resolver.relativize(Some("/required/1"), &schema),
            "tcapi:1.0.1#statement/required/1"
        );
        assert_eq!(
            resolver.relativize(Some("/required/7"), &schema),
            "tcapi:1.0.1#statement/required/7<N/A>"
        );
    }

    #[test]
    fn ref_cycles_terminate() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:1.0.1"});
        assert_eq!(
            resolver.relativize(Some("/properties/loop_a/type"), &schema),
            "tcapi:1.0.1/properties/loop_a/type<N/A>"
        );
    }

    #[test]
    fn recursive_schemas_are_reentered_per_segment() {
        let repo = SchemaRepository::new();
        repo.register(
            "tcapi:t",
            json!({
                "properties": {
                    "node": {
                        "id": "#node",
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "children": {"type": "array", "items": {"$ref": "#node"}}
                        }
                    }
                }
            }),
        );
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:t#node"});
        assert_eq!(
            resolver.relativize(Some("/properties/children/items/properties/name/type"), &schema),
            "#node/properties/name/type"
        );
        assert_eq!(
            resolver.relativize(
                Some("/properties/children/items/properties/children/items/properties/name"),
                &schema
            ),
            "#node/properties/name"
        );
    }

    #[test]
    fn unknown_top_level_ref_walks_the_literal_schema() {
        let repo = repo();
        let resolver = PathResolver::new(&repo);
        let schema = json!({"$ref": "tcapi:9.9#x"});
        assert_eq!(
            resolver.relativize(Some("/properties"), &schema),
            "tcapi:9.9#x/properties<N/A>"
        );
    }

    #[test]
    fn root_id_acts_as_base_for_relative_refs() {
        let repo = SchemaRepository::new();
        let meta = json!({
            "id": "http://example.test/meta#",
            "properties": {"not": {"$ref": "#"}, "title": {"type": "string"}}
        });
        repo.register("http://example.test/meta", meta.clone());
        let resolver = PathResolver::new(&repo);
        assert_eq!(
            resolver.relativize(Some("/properties/not/properties/title/type"), &meta),
            "http://example.test/meta#/properties/title/type"
        );
    }
}
