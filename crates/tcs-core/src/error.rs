//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy shared by the composer, splitter and validator.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Fragment/filename inconsistencies carry an [`IdSuggestion`] naming the
//!   id the file should declare.
//! - `UnknownSchemaReference` (a `$ref` the repository has never seen) is
//!   never conflated with `MissingSchemas` (names the engine could not
//!   resolve while validating).
//! - Wrapping adds a `Context` layer; [`SchemaError::root_cause`] peels the
//!   layers back off so callers can still match on the underlying kind.
//! - Filesystem errors stay structured here; only the CLI turns them into
//!   sentences.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

use crate::report::{add_error, ErrorItem, ValidationError};

/// The id a fragment declares versus the id its filename demands.
#[derive(Debug, Clone, PartialEq)]
pub struct IdSuggestion {
    /// The `id` value found in the file, if there was one.
    pub is: Option<Value>,
    /// `"#" + stripped basename`.
    pub should_be: String,
}

impl IdSuggestion {
    /// Suggestion for a file whose basename strips to `stripped`.
    pub fn new(is: Option<Value>, stripped: &str) -> Self {
        Self {
            is,
            should_be: format!("#{stripped}"),
        }
    }

    /// `{ "id": { "is": ..., "should_be": ... } }`; `is` is omitted when the
    /// file had no id at all.
    pub fn to_value(&self) -> Value {
        let mut id = serde_json::Map::new();
        if let Some(is) = &self.is {
            id.insert("is".to_string(), is.clone());
        }
        id.insert("should_be".to_string(), Value::String(self.should_be.clone()));
        json!({ "id": id })
    }
}

fn missing_id_message(suggestion: &IdSuggestion) -> &'static str {
    match suggestion.is {
        None => "File has no id field",
        Some(_) => "File has an invalid id field",
    }
}

/// Top-level error type for schema composition, splitting and validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Text could not be parsed as JSON (or YAML for instance documents).
    #[error("Could not parse {origin} as JSON: {reason}")]
    Parse {
        /// File path or `<stdin>`.
        origin: String,
        /// Parser message.
        reason: String,
    },

    /// A fragment has no `id`, or an `id` that is not a non-empty string.
    #[error("{}", missing_id_message(.suggestion))]
    MissingId {
        /// Offending fragment file.
        fpath: PathBuf,
        /// What the id should be.
        suggestion: IdSuggestion,
    },

    /// A fragment's `id` does not match its filename.
    #[error("Field 'id' does not match its filename")]
    IdMismatch {
        /// Offending fragment file.
        fpath: PathBuf,
        /// What the id should be.
        suggestion: IdSuggestion,
    },

    /// Two fragment files strip to the same property name.
    #[error("Fragments '{}' and '{}' both define '{name}'", .first.display(), .second.display())]
    DuplicateName {
        /// The colliding stripped name.
        name: String,
        /// File that claimed the name first.
        first: PathBuf,
        /// File that collided with it.
        second: PathBuf,
    },

    /// A fragment directory contributed no `.json` files.
    #[error("The directory '{}' has no .json files!", .dir.display())]
    NoSchemaFiles {
        /// The directory that was scanned.
        dir: PathBuf,
    },

    /// A split destination exists but is not a directory.
    #[error("Not a directory:  {}", .path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A schema handed to the splitter has no `properties` object.
    #[error("Schema has no 'properties' object to split")]
    MissingProperties,

    /// A composite property whose key cannot name a file inside the split
    /// destination.
    #[error("Property {name:?} cannot be written as a fragment file")]
    InvalidFragmentName {
        /// The offending property key.
        name: String,
    },

    /// A `$ref` names a schema that was never registered.
    #[error("Unknown schema reference: {reference:?}")]
    UnknownSchemaReference {
        /// The reference as written.
        reference: String,
    },

    /// The engine could not resolve one or more referenced schemas.
    #[error("MISSING schemas: {}", .missing.join(", "))]
    MissingSchemas {
        /// Unresolved schema names, in the order the engine reported them.
        missing: Vec<String>,
    },

    /// The instance does not conform to the schema.
    #[error("{0}")]
    Invalid(Box<ValidationError>),

    /// A custom string format could not be compiled.
    #[error("Invalid format value")]
    Format {
        /// Format name.
        name: String,
        /// The value found in the formats file.
        value: Value,
        /// Compiler message, when a regex failed to build.
        reason: Option<String>,
    },

    /// Filesystem failure.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Serialization failure while writing a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure wrapped with an explanation of what was being attempted.
    #[error("{message}")]
    Context {
        /// What was being attempted.
        message: String,
        /// The underlying failure.
        source: Box<SchemaError>,
        /// Diagnostic payload (e.g. the document that failed).
        data: Option<Value>,
        /// File the failure relates to.
        fpath: Option<PathBuf>,
    },
}

impl SchemaError {
    /// Filesystem failure at `path`.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap `self` in a context layer.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
            source: Box::new(self),
            data: None,
            fpath: None,
        }
    }

    /// Attach a diagnostic payload to a context layer. Other variants are
    /// wrapped first.
    pub fn with_data(self, value: Value) -> Self {
        match self {
            Self::Context {
                message,
                source,
                fpath,
                ..
            } => Self::Context {
                message,
                source,
                data: Some(value),
                fpath,
            },
            other => Self::Context {
                message: other.to_string(),
                source: Box::new(other),
                data: Some(value),
                fpath: None,
            },
        }
    }

    /// Attach a file path to a context layer. Other variants are wrapped
    /// first.
    pub fn with_fpath(self, path: impl AsRef<Path>) -> Self {
        let path = Some(path.as_ref().to_path_buf());
        match self {
            Self::Context {
                message,
                source,
                data,
                ..
            } => Self::Context {
                message,
                source,
                data,
                fpath: path,
            },
            other => Self::Context {
                message: other.to_string(),
                source: Box::new(other),
                data: None,
                fpath: path,
            },
        }
    }

    /// The innermost error beneath any `Context` layers.
    pub fn root_cause(&self) -> &SchemaError {
        let mut current = self;
        while let Self::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Errno-style code for filesystem failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Io { source, .. } => io_error_code(source),
            _ => None,
        }
    }

    /// Turn any error into a [`ValidationError`] node so it can be
    /// aggregated, simplified and printed alongside engine failures.
    pub fn to_report(&self) -> ValidationError {
        match self {
            Self::Invalid(report) => (**report).clone(),
            Self::Context {
                message,
                source,
                data,
                fpath,
            } => {
                let mut node = add_error(vec![ErrorItem::from(source.as_ref())], message.clone());
                node.data = data.clone();
                node.fpath = fpath.as_ref().map(|p| p.display().to_string());
                node
            }
            Self::MissingId { fpath, suggestion } | Self::IdMismatch { fpath, suggestion } => {
                let mut node = ValidationError::new(self.to_string());
                node.fpath = Some(fpath.display().to_string());
                node.suggestion = Some(suggestion.to_value());
                node
            }
            Self::DuplicateName { second, .. } => {
                let mut node = ValidationError::new(self.to_string());
                node.fpath = Some(second.display().to_string());
                node
            }
            Self::Format { name, value, reason } => {
                let mut node = ValidationError::new(self.to_string());
                let mut data = serde_json::Map::new();
                data.insert("name".to_string(), Value::String(name.clone()));
                data.insert("value".to_string(), value.clone());
                if let Some(reason) = reason {
                    data.insert("reason".to_string(), Value::String(reason.clone()));
                }
                node.data = Some(Value::Object(data));
                node
            }
            Self::Io { path, source } => {
                let mut node = ValidationError::new(source.to_string());
                node.fpath = Some(path.display().to_string());
                node.code = io_error_code(source).map(str::to_string);
                node
            }
            Self::MissingSchemas { missing } => {
                let mut node = ValidationError::new(self.to_string());
                node.data = Some(Value::from(missing.clone()));
                node
            }
            _ => ValidationError::new(self.to_string()),
        }
    }
}

/// Errno-style name for the io failures the CLI knows how to explain.
pub fn io_error_code(err: &io::Error) -> Option<&'static str> {
    match err.kind() {
        io::ErrorKind::NotFound => Some("ENOENT"),
        io::ErrorKind::PermissionDenied => Some("EACCES"),
        io::ErrorKind::IsADirectory => Some("EISDIR"),
        io::ErrorKind::NotADirectory => Some("ENOTDIR"),
        io::ErrorKind::AlreadyExists => Some("EEXIST"),
        _ => None,
    }
}
