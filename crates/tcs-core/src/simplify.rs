//! # Error Simplification
//!
//! Collapses a [`ValidationError`] tree into nested sequences that read like
//! a stack: single-cause chains become flat lists, siblings become nested
//! lists. The result is for display only and cannot be turned back into a
//! tree.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::report::ValidationError;

/// A node of the simplified form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Simplified {
    /// A node that only had a message.
    Message(String),
    /// A node with structured fields besides its message.
    Data(Map<String, Value>),
    /// A chain or a group of siblings.
    Seq(Vec<Simplified>),
}

impl Simplified {
    /// Convert into a plain JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Message(message) => Value::String(message.clone()),
            Self::Data(fields) => Value::Object(fields.clone()),
            Self::Seq(items) => Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }
}

fn head(err: &ValidationError) -> Simplified {
    if err.has_extra_fields() {
        Simplified::Data(err.head_fields())
    } else {
        Simplified::Message(err.message.clone())
    }
}

/// Simplify one node.
///
/// - no children: `[head]`
/// - one child: `[head, ...simplify(child)]`
/// - several: `[head, [simplify(c1), simplify(c2), ...]]`
pub fn simplify(err: &ValidationError) -> Vec<Simplified> {
    let mut out = vec![head(err)];
    match err.sub_errors.as_slice() {
        [] => {}
        [only] => out.extend(simplify(only)),
        many => out.push(Simplified::Seq(
            many.iter().map(|child| Simplified::Seq(simplify(child))).collect(),
        )),
    }
    out
}

/// Simplify a list of children the way a parent's `subErrors` is printed:
/// `None` when empty, the child's flat chain for one child, a list of chains
/// otherwise.
pub fn simplify_sub_errors(errs: &[ValidationError]) -> Option<Simplified> {
    match errs {
        [] => None,
        [only] => Some(Simplified::Seq(simplify(only))),
        many => Some(Simplified::Seq(
            many.iter().map(|child| Simplified::Seq(simplify(child))).collect(),
        )),
    }
}

/// Pretty-print JSON with a 4-space indent.
pub fn to_pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render a tree for the console: the root's fields as an object whose
/// `subErrors` holds the simplified children.
pub fn render_report(err: &ValidationError) -> String {
    let mut fields = err.head_fields();
    if let Some(children) = simplify_sub_errors(&err.sub_errors) {
        fields.insert("subErrors".to_string(), children.to_value());
    }
    let value = Value::Object(fields);
    to_pretty_json(&value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(m: &str) -> ValidationError {
        ValidationError::new(m)
    }

    fn with_children(m: &str, children: Vec<ValidationError>) -> ValidationError {
        let mut e = msg(m);
        e.sub_errors = children;
        e
    }

    #[test]
    fn leaf_is_single_element_sequence() {
        assert_eq!(simplify(&msg("boom")), vec![Simplified::Message("boom".into())]);
    }

    #[test]
    fn single_child_chain_is_flat() {
        let tree = with_children("a", vec![with_children("b", vec![msg("c")])]);
        let value = Simplified::Seq(simplify(&tree)).to_value();
        assert_eq!(value, json!(["a", "b", "c"]));
    }

    #[test]
    fn siblings_are_grouped() {
        let tree = with_children("head", vec![msg("one"), msg("two")]);
        let value = Simplified::Seq(simplify(&tree)).to_value();
        assert_eq!(value, json!(["head", [["one"], ["two"]]]));
    }

    #[test]
    fn extra_fields_keep_structured_head() {
        let mut child = msg("Field 'id' does not match its filename");
        child.fpath = Some("schema/b.json".into());
        child.suggestion = Some(json!({"id": {"is": "#wrong", "should_be": "#b"}}));
        let tree = with_children("Could not load schema directory 'schema'", vec![child]);

        let value = Simplified::Seq(simplify(&tree)).to_value();
        assert_eq!(
            value,
            json!([
                "Could not load schema directory 'schema'",
                {
                    "message": "Field 'id' does not match its filename",
                    "fpath": "schema/b.json",
                    "suggestion": {"id": {"is": "#wrong", "should_be": "#b"}}
                }
            ])
        );
    }

    #[test]
    fn data_head_in_middle_of_chain_stays_flat() {
        let mut middle = msg("middle");
        middle.data_path = Some("/actor".into());
        middle.sub_errors = vec![msg("leaf")];
        let tree = with_children("top", vec![middle]);
        let value = Simplified::Seq(simplify(&tree)).to_value();
        assert_eq!(
            value,
            json!(["top", {"message": "middle", "dataPath": "/actor"}, "leaf"])
        );
    }

    #[test]
    fn empty_children_behave_as_absent() {
        assert_eq!(simplify_sub_errors(&[]), None);
        let tree = with_children("x", Vec::new());
        assert_eq!(simplify(&tree).len(), 1);
    }

    #[test]
    fn render_report_simplifies_children() {
        let tree = with_children(
            "INVALID as 'tcapi:1.0.1#statement'",
            vec![with_children("2 schema violations", vec![msg("one"), msg("two")])],
        );
        let rendered = render_report(&tree);
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed,
            json!({
                "message": "INVALID as 'tcapi:1.0.1#statement'",
                "subErrors": ["2 schema violations", [["one"], ["two"]]]
            })
        );
        assert!(rendered.contains("\n    \"subErrors\""));
    }
}
