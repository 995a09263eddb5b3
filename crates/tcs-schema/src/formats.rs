//! # Custom String Formats
//!
//! A schema directory may carry `formats/formats.json`, an object mapping a
//! format name to a regular expression:
//!
//! ```json
//! {
//!     "mbox": "^mailto:",
//!     "language-map-key": ["^[a-z]{2,3}(-[A-Za-z0-9]+)*$", "i"],
//!     "unused": []
//! }
//! ```
//!
//! A value is a pattern string, `[pattern]`, `[pattern, flags]`, or `[]`
//! (skipped). Flags use the JavaScript letters: `i`, `m` and `s` become
//! inline regex flags; `g` and `u` are accepted and have no effect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tcs_core::SchemaError;

/// Location of the formats file inside a schema directory.
pub const FORMATS_FILE: &str = "formats/formats.json";

/// Patterns longer than this are not quoted in mismatch messages.
const MAX_DISPLAYED_PATTERN: usize = 160;

/// A compiled format with the flags it was written with.
#[derive(Debug, Clone)]
struct Pattern {
    regex: Regex,
    flags: String,
}

/// Named regex formats, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Pattern>,
}

fn invalid(name: &str, value: &Value, reason: Option<String>) -> SchemaError {
    SchemaError::Format {
        name: name.to_string(),
        value: value.clone(),
        reason,
    }
}

fn compile(name: &str, value: &Value) -> Result<Option<Pattern>, SchemaError> {
    let (pattern, flags) = match value {
        Value::String(pattern) => (pattern.as_str(), ""),
        Value::Array(items) => match items.as_slice() {
            [] => return Ok(None),
            [Value::String(pattern)] => (pattern.as_str(), ""),
            [Value::String(pattern), Value::String(flags)] => (pattern.as_str(), flags.as_str()),
            _ => return Err(invalid(name, value, None)),
        },
        _ => return Err(invalid(name, value, None)),
    };

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'g' | 'u' => &mut builder,
            other => {
                return Err(invalid(name, value, Some(format!("unsupported flag '{other}'"))));
            }
        };
    }
    let regex = builder
        .build()
        .map_err(|e| invalid(name, value, Some(e.to_string())))?;
    Ok(Some(Pattern {
        regex,
        flags: flags.to_string(),
    }))
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every entry of a parsed formats file.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let Value::Object(entries) = value else {
            return Err(SchemaError::Parse {
                origin: FORMATS_FILE.to_string(),
                reason: "expected an object of format names".to_string(),
            });
        };
        let mut registry = Self::new();
        for (name, pattern) in entries {
            if let Some(compiled) = compile(name, pattern)? {
                registry.formats.insert(name.clone(), compiled);
            }
        }
        Ok(registry)
    }

    /// Read formats from `path`. A missing file yields an empty registry.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no custom formats");
                return Ok(Self::new());
            }
            Err(e) => return Err(SchemaError::io(path, e)),
        };
        let value: Value = serde_json::from_str(&text).map_err(|e| SchemaError::Parse {
            origin: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let registry = Self::from_value(&value)
            .map_err(|e| e.context("Invalid formats file").with_fpath(path))?;
        tracing::debug!(path = %path.display(), count = registry.len(), "loaded custom formats");
        Ok(registry)
    }

    /// Read `<schema_dir>/formats/formats.json`.
    pub async fn load_from_schema_dir(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        Self::load(Self::path_in(schema_dir)).await
    }

    /// Where the formats file of `schema_dir` lives.
    pub fn path_in(schema_dir: impl AsRef<Path>) -> PathBuf {
        schema_dir.as_ref().join(FORMATS_FILE)
    }

    /// Format names with their compiled patterns.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.formats.iter().map(|(name, p)| (name.as_str(), &p.regex))
    }

    /// Format names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.formats.keys().map(String::as_str).collect()
    }

    /// Add every format of `other`, replacing same-named entries.
    pub fn extend(&mut self, other: &FormatRegistry) {
        for (name, pattern) in &other.formats {
            self.formats.insert(name.clone(), pattern.clone());
        }
    }

    /// Returns true if `value` matches the format `name`; `None` for an
    /// unknown format.
    pub fn check(&self, name: &str, value: &str) -> Option<bool> {
        self.formats.get(name).map(|p| p.regex.is_match(value))
    }

    /// Message for `value` failing the format `name`, e.g.
    /// `"a@b.c" does not match mbox = /^mailto:/`. `None` for an unknown
    /// format.
    pub fn mismatch_message(&self, name: &str, value: &str) -> Option<String> {
        let pattern = self.formats.get(name)?;
        let quoted = Value::String(value.to_string());
        let source = pattern.regex.as_str();
        Some(if source.len() < MAX_DISPLAYED_PATTERN {
            format!("{quoted} does not match {name} = /{source}/{}", pattern.flags)
        } else {
            format!("{quoted} does not match {name}. Regex is too long to display; see '{FORMATS_FILE}'")
        })
    }

    /// Returns the number of formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Returns true if there are no formats.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
