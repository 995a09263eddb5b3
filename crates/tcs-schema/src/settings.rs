//! Where schemas live and what they are called.

use std::path::{Path, PathBuf};

/// Schema directory used when none is given, relative to the repository
/// root.
pub const DEFAULT_SCHEMA_DIR: &str = "schema/1.0.1";

/// Prefix of the default schema name.
pub const SCHEMA_NAME_PREFIX: &str = "tcapi:";

/// Resolved configuration for loading a schema directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSettings {
    /// Directory of fragment files.
    pub schema_dir: PathBuf,
    /// Name the composite is registered under.
    pub schema_name: String,
    /// Whether schemas are checked against the metaschema.
    pub validate_schemas: bool,
}

impl SchemaSettings {
    /// Settings for `schema_dir` with the default name and checks enabled.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        let schema_dir = schema_dir.into();
        Self {
            schema_name: default_schema_name(&schema_dir),
            schema_dir,
            validate_schemas: true,
        }
    }

    /// Settings for [`DEFAULT_SCHEMA_DIR`] under `repo_root`.
    pub fn for_repo_root(repo_root: impl AsRef<Path>) -> Self {
        Self::new(repo_root.as_ref().join(DEFAULT_SCHEMA_DIR))
    }

    /// Override the registered name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = name.into();
        self
    }

    /// Turn metaschema checks on or off.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_schemas = enabled;
        self
    }
}

/// `tcapi:<last path component>`, e.g. `tcapi:1.0.1` for `schema/1.0.1`.
pub fn default_schema_name(schema_dir: impl AsRef<Path>) -> String {
    let dir = schema_dir.as_ref();
    let base = dir
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{SCHEMA_NAME_PREFIX}{base}")
}
