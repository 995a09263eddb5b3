//! Reading and writing schema files, with metaschema checks on the way in
//! and on the way out.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tcs_core::{to_pretty_json, SchemaError, DRAFT_04_SCHEMA_URI};

use crate::io::read_json_file;
use crate::validator::Validator;

/// Schema file access shared by the composer and the splitter.
#[derive(Debug, Clone)]
pub struct SchemaFiles {
    validator: Arc<Validator>,
    validate_schemas: bool,
}

impl SchemaFiles {
    /// File access that validates every schema it reads or writes.
    pub fn new(validator: Arc<Validator>) -> Self {
        Self {
            validator,
            validate_schemas: true,
        }
    }

    /// Turn metaschema checks on or off.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_schemas = enabled;
        self
    }

    /// Returns true if schemas are checked against the metaschema.
    pub fn validates_schemas(&self) -> bool {
        self.validate_schemas
    }

    /// The validator used for metaschema checks.
    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    /// Check a schema read from `path` against the metaschema, when checks
    /// are enabled.
    pub fn check_schema(&self, schema: &Value, path: &Path) -> Result<(), SchemaError> {
        if !self.validate_schemas {
            return Ok(());
        }
        self.validator.validate_schema(schema).map_err(|e| {
            e.context(format!("Schema in file '{}' failed validation", path.display()))
                .with_data(schema.clone())
                .with_fpath(path)
        })
    }

    /// Read one schema file.
    pub async fn load_schema(&self, path: impl AsRef<Path>) -> Result<Value, SchemaError> {
        let path = path.as_ref();
        let schema = read_json_file(path).await?;
        self.check_schema(&schema, path)?;
        Ok(schema)
    }

    /// Make `schema` ready to be written: `$schema` is added when absent and
    /// the result is validated unless checks are disabled.
    pub fn prepare(&self, mut schema: Value) -> Result<Value, SchemaError> {
        if let Some(map) = schema.as_object_mut() {
            let present = map.get("$schema").is_some_and(|v| !is_falsy(v));
            if !present {
                map.insert(
                    "$schema".to_string(),
                    Value::String(DRAFT_04_SCHEMA_URI.to_string()),
                );
            }
        }
        if self.validate_schemas {
            if let Err(e) = self.validator.validate_schema(&schema) {
                return Err(e
                    .context("Could not save schema; failed validation")
                    .with_data(schema));
            }
        }
        Ok(schema)
    }

    /// Prepare `schema` and write it to `path` as 4-space indented JSON.
    pub async fn write_schema(&self, schema: Value, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        let prepared = self.prepare(schema)?;
        write_prepared(&prepared, path.as_ref()).await
    }
}

/// A `$schema` of `""`, `null` or `false` counts as missing.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Write an already prepared schema.
pub(crate) async fn write_prepared(schema: &Value, path: &Path) -> Result<(), SchemaError> {
    let text = to_pretty_json(schema)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| SchemaError::io(path, e))?;
    tracing::info!(path = %path.display(), "Wrote file");
    Ok(())
}
