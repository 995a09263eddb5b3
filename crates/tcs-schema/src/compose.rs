//! # Schema Composition
//!
//! Builds one composite schema out of a directory of fragment files.
//!
//! Every fragment must declare `"id": "#<name>"`, where `<name>` is its
//! file name with all extensions removed. The composite is
//!
//! ```json
//! {
//!     "$schema": "http://json-schema.org/draft-04/schema#",
//!     "additionalProperties": false,
//!     "type": "object",
//!     "properties": { "<name>": <fragment without $schema>, ... }
//! }
//! ```
//!
//! Fragment files are read concurrently, then checked and inserted one at
//! a time in file-name order. The first failure in that order aborts the
//! whole composition; nothing partial is returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tcs_core::{has_ext, stripped_name, IdSuggestion, SchemaError, DRAFT_04_SCHEMA_URI};
use tokio::task::JoinSet;

use crate::io::parse_json;
use crate::store::SchemaFiles;

/// One fragment file and its text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Path of the file the text came from.
    pub path: PathBuf,
    /// Raw file contents.
    pub contents: String,
}

/// The fragment files of one directory, in file-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentListing {
    /// The directory that was listed.
    pub dir: PathBuf,
    /// Its `.json` files.
    pub fragments: Vec<Fragment>,
}

/// Composes fragment directories into composite schemas.
#[derive(Debug, Clone)]
pub struct SchemaComposer {
    files: SchemaFiles,
}

/// Check that `fragment` declares the id its file name demands and return
/// the property name it goes under.
fn check_id(fragment: &Value, path: &Path) -> Result<String, SchemaError> {
    let stripped = stripped_name(path);
    let id = fragment.get("id");
    let declared = match id {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            return Err(SchemaError::MissingId {
                fpath: path.to_path_buf(),
                suggestion: IdSuggestion::new(id.cloned(), &stripped),
            })
        }
    };
    let name = declared.strip_prefix('#').unwrap_or(declared);
    if name != stripped {
        return Err(SchemaError::IdMismatch {
            fpath: path.to_path_buf(),
            suggestion: IdSuggestion::new(id.cloned(), &stripped),
        });
    }
    Ok(stripped)
}

/// Regular `.json` files directly inside `dir`, sorted by file name.
pub(crate) async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SchemaError::io(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SchemaError::io(dir, e))?
    {
        let path = entry.path();
        if !has_ext(&path, "json") {
            continue;
        }
        // Entries that cannot be stat'ed (dangling links) are not files.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping entry"),
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

impl SchemaComposer {
    /// A composer reading and checking through `files`.
    pub fn new(files: SchemaFiles) -> Self {
        Self { files }
    }

    /// The schema file access this composer uses.
    pub fn files(&self) -> &SchemaFiles {
        &self.files
    }

    /// Compose already-read fragments.
    pub fn compose(&self, listing: FragmentListing) -> Result<Value, SchemaError> {
        let FragmentListing { dir, fragments } = listing;
        self.reduce(&dir, fragments.into_iter().map(Ok).collect())
    }

    /// Fold fragments into a composite in the order given, stopping at the
    /// first failure.
    fn reduce(&self, dir: &Path, fragments: Vec<Result<Fragment, SchemaError>>) -> Result<Value, SchemaError> {
        if fragments.is_empty() {
            return Err(SchemaError::NoSchemaFiles {
                dir: dir.to_path_buf(),
            });
        }

        let mut properties = Map::new();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for fragment in fragments {
            let Fragment { path, contents } = fragment?;
            let mut schema = parse_json(&contents, &path.display().to_string())?;
            let name = check_id(&schema, &path)?;
            self.files.check_schema(&schema, &path)?;

            if let Some(first) = claimed.get(&name) {
                return Err(SchemaError::DuplicateName {
                    name,
                    first: first.clone(),
                    second: path,
                });
            }
            if let Some(map) = schema.as_object_mut() {
                map.remove("$schema");
            }
            tracing::debug!(fragment = %name, path = %path.display(), "added fragment");
            claimed.insert(name.clone(), path);
            properties.insert(name, schema);
        }

        let composite = json!({
            "$schema": DRAFT_04_SCHEMA_URI,
            "additionalProperties": false,
            "type": "object",
            "properties": properties,
        });

        if self.files.validates_schemas() {
            self.files
                .validator()
                .validate_schema(&composite)
                .map_err(|e| e.context("Composite schema failed validation"))?;
        }
        Ok(composite)
    }

    /// Compose every `.json` file directly inside `dir`.
    pub async fn compose_dir(&self, dir: impl AsRef<Path>) -> Result<Value, SchemaError> {
        let dir = dir.as_ref();
        let paths = list_json_files(dir).await?;

        let mut loads = JoinSet::new();
        for (index, path) in paths.iter().cloned().enumerate() {
            loads.spawn(async move {
                tracing::info!(path = %path.display(), "Reading file");
                let contents = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| SchemaError::io(&path, e));
                (index, contents.map(|contents| Fragment { path, contents }))
            });
        }

        let mut loaded: Vec<Option<Result<Fragment, SchemaError>>> = Vec::new();
        loaded.resize_with(paths.len(), || None);
        while let Some(joined) = loads.join_next().await {
            let (index, fragment) =
                joined.map_err(|e| SchemaError::io(dir, std::io::Error::other(e)))?;
            loaded[index] = Some(fragment);
        }

        let fragments = loaded.into_iter().flatten().collect();
        self.reduce(dir, fragments)
    }

    /// Compose `dir`, validate the result, and register it under `name`.
    pub async fn load_schema_dir_as(&self, dir: impl AsRef<Path>, name: &str) -> Result<Value, SchemaError> {
        let dir = dir.as_ref();
        tracing::info!(dir = %dir.display(), "Loading schema from");
        let composite = self
            .compose_dir(dir)
            .await
            .map_err(|e| e.context(format!("Could not load schema directory '{}'", dir.display())))?;
        self.files
            .validator()
            .repository()
            .register(name, composite.clone());
        Ok(composite)
    }

    /// Compose `dir` and write the composite to `dst`.
    pub async fn join(&self, dir: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<Value, SchemaError> {
        let composite = self.compose_dir(dir).await?;
        self.files.write_schema(composite.clone(), dst).await?;
        Ok(composite)
    }
}
