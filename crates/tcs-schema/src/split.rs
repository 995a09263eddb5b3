//! Splitting a composite schema back into fragment files.

use std::path::{Component, Path};

use serde_json::Value;
use tcs_core::SchemaError;

use crate::store::{write_prepared, SchemaFiles};

/// Writes each property of a composite schema to its own file.
#[derive(Debug, Clone)]
pub struct SchemaSplitter {
    files: SchemaFiles,
}

/// Create `dir` if absent; fail if it exists as something else.
async fn ensure_dir(dir: &Path) -> Result<(), SchemaError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SchemaError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "creating directory");
            tokio::fs::create_dir(dir)
                .await
                .map_err(|e| SchemaError::io(dir, e))
        }
        Err(e) => Err(SchemaError::io(dir, e)),
    }
}

/// True if `name` is a single plain path component, so `<name>.json`
/// stays inside the destination directory.
fn is_fragment_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl SchemaSplitter {
    /// A splitter writing through `files`.
    pub fn new(files: SchemaFiles) -> Self {
        Self { files }
    }

    /// Write every entry of `schema.properties` to `<dst>/<key>.json`.
    ///
    /// All fragments are prepared and validated before the first file is
    /// written, so a failing fragment leaves no output behind.
    pub async fn split(&self, schema: &Value, dst: impl AsRef<Path>) -> Result<Vec<String>, SchemaError> {
        let dst = dst.as_ref();
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .ok_or(SchemaError::MissingProperties)?;

        ensure_dir(dst).await?;

        let mut prepared = Vec::with_capacity(properties.len());
        for (name, fragment) in properties {
            if !is_fragment_name(name) {
                return Err(SchemaError::InvalidFragmentName { name: name.clone() });
            }
            prepared.push((name.clone(), self.files.prepare(fragment.clone())?));
        }

        for (name, fragment) in &prepared {
            write_prepared(fragment, &dst.join(format!("{name}.json"))).await?;
        }
        Ok(prepared.into_iter().map(|(name, _)| name).collect())
    }

    /// Read the composite at `src`, checking it against the metaschema when
    /// checks are enabled, and split it into `dst`.
    pub async fn split_file(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<Vec<String>, SchemaError> {
        let schema = self.files.load_schema(src).await?;
        self.split(&schema, dst).await
    }
}
