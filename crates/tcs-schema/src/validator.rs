//! # Validator
//!
//! Orchestrates calls into the [`ValidationEngine`]:
//!
//! - A `{ "$ref": uri }` target is checked against the repository first; an
//!   unknown uri fails with `UnknownSchemaReference` and the engine is
//!   never called.
//! - Engine outcomes become `Ok`, `MissingSchemas`, or an `Invalid` error
//!   tree with schema-relative paths.
//! - The draft-04 metaschema is bundled, loaded lazily on first use,
//!   checked against itself, and registered exactly once. Concurrent first
//!   uses wait on the same guard instead of loading twice.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tcs_core::SchemaError;

use crate::engine::{JsonSchemaEngine, ValidationEngine};
use crate::formats::FormatRegistry;
use crate::io::read_json_file;
use crate::repository::SchemaRepository;
use crate::tree::build_error_tree;

/// Name the bundled metaschema is registered under.
pub const METASCHEMA_URI: &str = "http://json-schema.org/draft-04/schema";

const METASCHEMA_SOURCE: &str = include_str!("../resources/draft-04.json");

/// The loaded metaschema.
#[derive(Debug)]
struct Metaschema {
    /// The document as registered, used for schema-relative paths.
    document: Arc<Value>,
    /// The same document without `id`/`$schema`, so the engine evaluates
    /// this copy instead of any built-in one.
    standalone: Arc<Value>,
}

/// Validates instances and schemas through a [`ValidationEngine`].
pub struct Validator {
    repo: Arc<SchemaRepository>,
    engine: Arc<dyn ValidationEngine>,
    metaschema: Mutex<Option<Arc<Metaschema>>>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("schemas", &self.repo.names())
            .field("metaschema_loaded", &self.metaschema.lock().is_some())
            .finish()
    }
}

impl Validator {
    /// A validator using the `jsonschema` engine.
    pub fn new(repo: Arc<SchemaRepository>) -> Self {
        Self::with_engine(repo, Arc::new(JsonSchemaEngine::new()))
    }

    /// A validator using a caller-supplied engine.
    pub fn with_engine(repo: Arc<SchemaRepository>, engine: Arc<dyn ValidationEngine>) -> Self {
        Self {
            repo,
            engine,
            metaschema: Mutex::new(None),
        }
    }

    /// The repository references are resolved against.
    pub fn repository(&self) -> &Arc<SchemaRepository> {
        &self.repo
    }

    /// Install custom string formats into the engine.
    pub fn add_formats(&self, formats: &FormatRegistry) {
        self.engine.add_formats(formats);
    }

    /// Validate `instance` against `schema` (a schema document, or
    /// `{ "$ref": uri }`).
    pub fn validate(&self, instance: &Value, schema: &Value) -> Result<(), SchemaError> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if !self.repo.is_known(reference) {
                return Err(SchemaError::UnknownSchemaReference {
                    reference: reference.to_string(),
                });
            }
        }
        self.run(instance, schema, schema)
    }

    /// `engine_schema` is handed to the engine; `path_schema` anchors the
    /// schema-relative paths of any failure.
    fn run(&self, instance: &Value, engine_schema: &Value, path_schema: &Value) -> Result<(), SchemaError> {
        let outcome = self.engine.validate(instance, engine_schema, &self.repo);
        if outcome.valid {
            tracing::debug!("validation passed");
            return Ok(());
        }
        if !outcome.missing.is_empty() {
            return Err(SchemaError::MissingSchemas {
                missing: outcome.missing,
            });
        }
        let report = match outcome.error {
            Some(raw) => build_error_tree(&raw, path_schema, &self.repo),
            None => tcs_core::ValidationError::new("Validation failed without a reported cause"),
        };
        tracing::debug!(
            message = %report.message,
            nodes = report.node_count(),
            "validation failed"
        );
        Err(SchemaError::Invalid(Box::new(report)))
    }

    /// Load and register the metaschema if that has not happened yet.
    fn ensure_metaschema(&self) -> Result<Arc<Metaschema>, SchemaError> {
        let mut slot = self.metaschema.lock();
        if let Some(loaded) = slot.as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let loaded = self
            .load_metaschema()
            .map_err(|e| e.context("METASCHEMA failed to load"))?;
        self.repo.register(METASCHEMA_URI, (*loaded.document).clone());
        tracing::debug!(uri = METASCHEMA_URI, "metaschema loaded");
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    fn load_metaschema(&self) -> Result<Arc<Metaschema>, SchemaError> {
        let document: Value = serde_json::from_str(METASCHEMA_SOURCE).map_err(|e| SchemaError::Parse {
            origin: METASCHEMA_URI.to_string(),
            reason: e.to_string(),
        })?;
        let mut standalone = document.clone();
        if let Some(map) = standalone.as_object_mut() {
            map.remove("id");
            map.remove("$schema");
        }
        self.run(&document, &standalone, &document)?;
        Ok(Arc::new(Metaschema {
            document: Arc::new(document),
            standalone: Arc::new(standalone),
        }))
    }

    /// Validate `schema` as a draft-04 schema document.
    pub fn validate_schema(&self, schema: &Value) -> Result<(), SchemaError> {
        let meta = self.ensure_metaschema()?;
        self.run(schema, &meta.standalone, &meta.document)
    }

    /// Validate against the schema named by `uri`. Failures other than an
    /// unknown reference are wrapped in `INVALID as '<uri>'`.
    pub fn validate_with_uri(&self, instance: &Value, uri: &str) -> Result<(), SchemaError> {
        tracing::debug!(%uri, "validating");
        let schema = serde_json::json!({ "$ref": uri });
        self.validate(instance, &schema).map_err(|e| match e {
            SchemaError::UnknownSchemaReference { .. } => e,
            other => other.context(format!("INVALID as '{uri}'")),
        })
    }

    /// Read a JSON file and validate it against `uri`.
    pub async fn validate_file_with_uri(&self, path: impl AsRef<Path>, uri: &str) -> Result<(), SchemaError> {
        let instance = read_json_file(path).await?;
        self.validate_with_uri(&instance, uri)
    }
}
