//! Reading JSON and YAML documents from disk or stdin.

use std::path::Path;

use serde_json::Value;
use tcs_core::{has_ext, SchemaError};
use tokio::io::AsyncReadExt;

/// Origin label used for documents read from standard input.
pub const STDIN_ORIGIN: &str = "<stdin>";

/// Parse `text` as JSON; `origin` names the source in errors.
pub fn parse_json(text: &str, origin: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(text).map_err(|e| SchemaError::Parse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Parse `text` as YAML and convert the result to JSON.
pub fn parse_yaml(text: &str, origin: &str) -> Result<Value, SchemaError> {
    let parse_error = |reason: String| SchemaError::Parse {
        origin: origin.to_string(),
        reason,
    };
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
    yaml_to_json_value(&yaml).map_err(parse_error)
}

/// Returns true if `path` names a YAML document.
pub fn is_yaml(path: impl AsRef<Path>) -> bool {
    has_ext(&path, "yaml") || has_ext(&path, "yml")
}

/// Read and parse a JSON file.
pub async fn read_json_file(path: impl AsRef<Path>) -> Result<Value, SchemaError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Reading file");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SchemaError::io(path, e))?;
    parse_json(&text, &path.display().to_string())
}

/// Read an instance document, as YAML when the extension says so and as
/// JSON otherwise.
pub async fn read_instance_file(path: impl AsRef<Path>) -> Result<Value, SchemaError> {
    let path = path.as_ref();
    if !is_yaml(path) {
        return read_json_file(path).await;
    }
    tracing::info!(path = %path.display(), "Reading file");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SchemaError::io(path, e))?;
    parse_yaml(&text, &path.display().to_string())
}

/// Read all of standard input as text.
pub async fn read_stdin() -> Result<String, SchemaError> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(|e| SchemaError::io(STDIN_ORIGIN, e))?;
    Ok(text)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and non-string keys are stringified; anything JSON
/// cannot represent is an error.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
