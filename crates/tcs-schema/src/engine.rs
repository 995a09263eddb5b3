//! # Validation Engine
//!
//! The keyword evaluation itself is delegated to an engine behind the
//! [`ValidationEngine`] trait. The toolkit only calls it and interprets the
//! [`EngineOutcome`]; it never evaluates JSON-Schema keywords on its own.
//!
//! [`JsonSchemaEngine`] is the production engine, built on the `jsonschema`
//! crate in draft-04 mode. Cross-document `$ref`s are served from the
//! [`SchemaRepository`] by a local retriever, so validation never touches
//! the network. Names the retriever cannot serve are reported in
//! [`EngineOutcome::missing`] instead of as a validation failure.

use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::formats::FormatRegistry;
use crate::repository::SchemaRepository;

/// A failure as reported by an engine, before cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawError {
    /// Human-readable description.
    pub message: String,
    /// JSON Pointer into the instance; `None` when the engine gave none.
    pub data_path: Option<String>,
    /// JSON Pointer into the schema that was validated against.
    pub schema_path: String,
    /// Nested failures; `None` and `Some(vec![])` both mean a leaf.
    pub sub_errors: Option<Vec<RawError>>,
    /// Engine-internal debug data. Never shown to users.
    pub stack: Option<String>,
}

/// Result of a single engine call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutcome {
    /// Whether the instance conforms.
    pub valid: bool,
    /// Failure tree when invalid.
    pub error: Option<RawError>,
    /// Referenced schema names the engine could not resolve.
    pub missing: Vec<String>,
}

impl EngineOutcome {
    /// A passing outcome.
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// A failing outcome carrying `error`.
    pub fn invalid(error: RawError) -> Self {
        Self {
            valid: false,
            error: Some(error),
            missing: Vec::new(),
        }
    }

    /// An outcome reporting unresolved schema names.
    pub fn missing(names: Vec<String>) -> Self {
        Self {
            valid: false,
            error: None,
            missing: names,
        }
    }
}

/// The external keyword-evaluation capability.
///
/// Implementations must be pure with respect to the repository: they read
/// registered documents but never register anything.
pub trait ValidationEngine: Send + Sync {
    /// Validate `instance` against `schema`, resolving references through
    /// `repo`.
    fn validate(&self, instance: &Value, schema: &Value, repo: &SchemaRepository) -> EngineOutcome;

    /// Install custom string formats. Engines without format support ignore
    /// them.
    fn add_formats(&self, _formats: &FormatRegistry) {}
}

/// Serves `$ref` targets out of a repository snapshot and records every
/// name it could not serve.
struct RepositoryRetriever {
    documents: std::collections::HashMap<String, Arc<Value>>,
    missing: Arc<Mutex<Vec<String>>>,
}

impl Retrieve for RepositoryRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let name = uri.as_str();
        let name = name.split_once('#').map_or(name, |(base, _)| base);

        if let Some(document) = self.documents.get(name) {
            return Ok((**document).clone());
        }

        let mut missing = self.missing.lock();
        if !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
        Err(format!("schema '{name}' is not registered").into())
    }
}

/// Engine reports include one segment per `$ref` hop; the resolver
/// dereferences implicitly, so those segments are dropped.
fn strip_ref_hops(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "$ref")
        .fold(String::new(), |mut acc, segment| {
            acc.push('/');
            acc.push_str(segment);
            acc
        })
}

/// Longest shared run of leading segments.
fn common_prefix<'a>(paths: impl Iterator<Item = &'a str>) -> String {
    let mut prefix: Option<Vec<&str>> = None;
    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        prefix = Some(match prefix {
            None => segments,
            Some(current) => current
                .into_iter()
                .zip(segments)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    prefix
        .unwrap_or_default()
        .iter()
        .fold(String::new(), |acc, segment| format!("{acc}/{segment}"))
}

/// Group several sibling failures under one parent whose paths are what
/// the children have in common.
fn group(children: Vec<RawError>) -> RawError {
    let data_path = common_prefix(children.iter().map(|c| c.data_path.as_deref().unwrap_or("")));
    let schema_path = common_prefix(children.iter().map(|c| c.schema_path.as_str()));
    RawError {
        message: format!("{} schema violations", children.len()),
        data_path: Some(data_path),
        schema_path,
        sub_errors: Some(children),
        stack: None,
    }
}

/// Custom-format failures name the pattern; everything else keeps the
/// engine's message.
fn message_for(error: &jsonschema::ValidationError<'_>, formats: &FormatRegistry) -> String {
    if let (ValidationErrorKind::Format { format }, Value::String(value)) = (&error.kind, &*error.instance) {
        if let Some(message) = formats.mismatch_message(format, value) {
            return message;
        }
    }
    error.to_string()
}

fn raw_from(error: &jsonschema::ValidationError<'_>, formats: &FormatRegistry) -> RawError {
    RawError {
        message: message_for(error, formats),
        data_path: Some(error.instance_path.to_string()),
        schema_path: strip_ref_hops(&error.schema_path.to_string()),
        sub_errors: None,
        stack: Some(format!("{:?}", error.kind)),
    }
}

/// Draft-04 engine over the `jsonschema` crate.
#[derive(Default)]
pub struct JsonSchemaEngine {
    formats: RwLock<FormatRegistry>,
}

impl std::fmt::Debug for JsonSchemaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaEngine")
            .field("formats", &self.formats.read().names())
            .finish()
    }
}

impl JsonSchemaEngine {
    /// An engine with only the built-in draft-04 formats.
    pub fn new() -> Self {
        Self::default()
    }

    fn build_options(&self, retriever: RepositoryRetriever) -> jsonschema::ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft4);
        opts.should_validate_formats(true);
        opts.with_retriever(retriever);

        for (name, regex) in self.formats.read().iter() {
            let regex = regex.clone();
            opts.with_format(name.to_string(), move |value: &str| regex.is_match(value));
        }
        opts
    }
}

impl ValidationEngine for JsonSchemaEngine {
    fn validate(&self, instance: &Value, schema: &Value, repo: &SchemaRepository) -> EngineOutcome {
        let missing = Arc::new(Mutex::new(Vec::new()));
        let retriever = RepositoryRetriever {
            documents: repo.snapshot(),
            missing: Arc::clone(&missing),
        };

        let validator = match self.build_options(retriever).build(schema) {
            Ok(validator) => validator,
            Err(error) => {
                let names = std::mem::take(&mut *missing.lock());
                if !names.is_empty() {
                    tracing::debug!(missing = ?names, "engine could not resolve schemas");
                    return EngineOutcome::missing(names);
                }
                let mut raw = raw_from(&error, &FormatRegistry::new());
                raw.message = format!("Schema could not be compiled: {error}");
                raw.data_path = None;
                return EngineOutcome::invalid(raw);
            }
        };

        let formats = self.formats.read();
        let mut failures: Vec<RawError> = validator
            .iter_errors(instance)
            .map(|e| raw_from(&e, &formats))
            .collect();
        drop(formats);

        let names = std::mem::take(&mut *missing.lock());
        if !names.is_empty() {
            return EngineOutcome::missing(names);
        }

        match failures.len() {
            0 => EngineOutcome::valid(),
            1 => EngineOutcome::invalid(failures.remove(0)),
            _ => EngineOutcome::invalid(group(failures)),
        }
    }

    fn add_formats(&self, formats: &FormatRegistry) {
        self.formats.write().extend(formats);
    }
}
