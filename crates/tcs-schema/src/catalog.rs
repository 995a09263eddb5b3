//! # Schema Catalog
//!
//! A composite schema loaded from a schema directory and registered under a
//! name such as `tcapi:1.0.1`. Each top-level property of the composite is
//! a *type id* (`statement`, `agent`, ...); instances are validated against
//! `<name>#<type id>`.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tcs_core::{add_error, ErrorItem, SchemaError};

use crate::compose::SchemaComposer;
use crate::formats::FormatRegistry;
use crate::io::read_instance_file;
use crate::repository::SchemaRepository;
use crate::settings::SchemaSettings;
use crate::store::SchemaFiles;
use crate::validator::Validator;

/// A loaded, named composite with its custom formats installed.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    settings: SchemaSettings,
    schema: Arc<Value>,
    validator: Arc<Validator>,
}

impl SchemaCatalog {
    /// Load the schema directory named by `settings` into a fresh
    /// repository.
    pub async fn load(settings: SchemaSettings) -> Result<Self, SchemaError> {
        let validator = Arc::new(Validator::new(Arc::new(SchemaRepository::new())));
        Self::load_with(settings, validator).await
    }

    /// Load the schema directory named by `settings` through `validator`.
    pub async fn load_with(settings: SchemaSettings, validator: Arc<Validator>) -> Result<Self, SchemaError> {
        tracing::info!(dir = %settings.schema_dir.display(), name = %settings.schema_name, "Loading schema from");
        let files = SchemaFiles::new(Arc::clone(&validator)).with_validation(settings.validate_schemas);
        let schema = SchemaComposer::new(files)
            .load_schema_dir_as(&settings.schema_dir, &settings.schema_name)
            .await
            .map_err(|e| e.context("SCHEMA was invalid"))?;

        let formats = FormatRegistry::load_from_schema_dir(&settings.schema_dir).await?;
        validator.add_formats(&formats);

        Ok(Self {
            settings,
            schema: Arc::new(schema),
            validator,
        })
    }

    /// Name the composite is registered under.
    pub fn schema_name(&self) -> &str {
        &self.settings.schema_name
    }

    /// Directory the composite was loaded from.
    pub fn schema_dir(&self) -> &Path {
        &self.settings.schema_dir
    }

    /// The composite document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// The validator the composite is registered with.
    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    /// Type ids in the order the composite lists them.
    pub fn type_ids(&self) -> Vec<String> {
        self.schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true if `id` is a type id of this catalog.
    pub fn has_type_id(&self, id: &str) -> bool {
        self.schema
            .get("properties")
            .and_then(|props| props.get(id))
            .is_some()
    }

    /// `<schema name>#<id>`.
    pub fn uri_for(&self, id: &str) -> String {
        format!("{}#{id}", self.settings.schema_name)
    }

    /// Validate `instance` as type `id`.
    pub fn validate_with_id(&self, instance: &Value, id: &str) -> Result<(), SchemaError> {
        let uri = self.uri_for(id);
        self.validator.validate_with_uri(instance, &uri)?;
        tracing::debug!(%uri, "valid");
        Ok(())
    }

    /// Validate `instance` against every type id. Returns the ids it is
    /// valid as, sorted; fails with every individual failure when there
    /// are none.
    pub fn validate_as_any(&self, instance: &Value) -> Result<Vec<String>, SchemaError> {
        let mut matches = Vec::new();
        let mut failures = Vec::new();
        for id in self.type_ids() {
            match self.validate_with_id(instance, &id) {
                Ok(()) => matches.push(id),
                Err(e) => failures.push(e.to_report()),
            }
        }
        if !matches.is_empty() {
            matches.sort();
            return Ok(matches);
        }
        let report = add_error(
            vec![ErrorItem::Many(failures)],
            format!("Not valid as any {} object", self.settings.schema_name),
        );
        Err(SchemaError::Invalid(Box::new(report)))
    }

    /// Read a JSON (or YAML) file and validate it as type `id`.
    pub async fn validate_json_file(&self, path: impl AsRef<Path>, id: &str) -> Result<(), SchemaError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Processing");
        let instance = read_instance_file(path).await?;
        self.validate_with_id(&instance, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn catalog(root: &Path) -> SchemaCatalog {
        let dir = root.join("1.0.1");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(
            dir.join("agent.json"),
            r##"{"id": "#agent", "type": "object", "required": ["mbox"], "properties": {"mbox": {"type": "string", "format": "mbox"}}}"##,
        )
        .unwrap();
        std::fs::write(
            dir.join("verb.json"),
            r##"{"id": "#verb", "type": "object", "required": ["id"], "properties": {"id": {"type": "string"}}}"##,
        )
        .unwrap();
        std::fs::create_dir(dir.join("formats")).unwrap();
        std::fs::write(dir.join("formats/formats.json"), r#"{"mbox": "^mailto:"}"#).unwrap();
        SchemaCatalog::load(SchemaSettings::new(&dir)).await.unwrap()
    }

    #[tokio::test]
    async fn loads_and_names_the_composite() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path()).await;
        assert_eq!(catalog.schema_name(), "tcapi:1.0.1");
        assert_eq!(catalog.type_ids(), ["agent", "verb"]);
        assert!(catalog.has_type_id("verb"));
        assert!(!catalog.has_type_id("statement"));
    }

    #[tokio::test]
    async fn validates_by_type_id_with_custom_formats() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path()).await;

        catalog.validate_with_id(&json!({"mbox": "mailto:a@b.c"}), "agent").unwrap();
        let err = catalog
            .validate_with_id(&json!({"mbox": "a@b.c"}), "agent")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "INVALID as 'tcapi:1.0.1#agent'"
        );
    }

    #[tokio::test]
    async fn validate_as_any_lists_matches_or_all_failures() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path()).await;

        let ids = catalog
            .validate_as_any(&json!({"mbox": "mailto:a@b.c", "id": "x"}))
            .unwrap();
        assert_eq!(ids, ["agent", "verb"]);

        let err = catalog.validate_as_any(&json!({})).unwrap_err();
        let report = err.to_report();
        assert_eq!(
            report.message,
            "Not valid as any tcapi:1.0.1 object"
        );
        assert_eq!(report.sub_errors.len(), 2);
    }

    #[tokio::test]
    async fn broken_directory_is_reported_as_invalid_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("agent.json"), r##"{"id": "#nope"}"##).unwrap();
        let err = SchemaCatalog::load(SchemaSettings::new(dir.path())).await.unwrap_err();
        assert_eq!(err.to_string(), "SCHEMA was invalid");
        assert!(matches!(err.root_cause(), SchemaError::IdMismatch { .. }));
    }
}
