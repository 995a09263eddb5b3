//! Conversion of raw engine failures into [`ValidationError`] trees.

use serde_json::Value;
use tcs_core::ValidationError;

use crate::engine::RawError;
use crate::repository::SchemaRepository;
use crate::resolver::PathResolver;

/// Clean `raw` into a [`ValidationError`], computing schema-relative paths
/// against `schema` (the schema the instance was validated against).
///
/// Debug data is dropped, an absent or empty `dataPath` becomes `"/"`, and
/// absent children become a leaf. Children are cleaned the same way.
pub fn build_error_tree(raw: &RawError, schema: &Value, repo: &SchemaRepository) -> ValidationError {
    build(raw, schema, &PathResolver::new(repo))
}

fn build(raw: &RawError, schema: &Value, resolver: &PathResolver<'_>) -> ValidationError {
    let data_path = match raw.data_path.as_deref() {
        None | Some("") => "/".to_string(),
        Some(path) => path.to_string(),
    };
    ValidationError {
        message: raw.message.clone(),
        data_path: Some(data_path),
        schema_relative_path: Some(resolver.relativize(Some(&raw.schema_path), schema)),
        schema_path: Some(raw.schema_path.clone()),
        sub_errors: raw
            .sub_errors
            .iter()
            .flatten()
            .map(|child| build(child, schema, resolver))
            .collect(),
        ..ValidationError::default()
    }
}
