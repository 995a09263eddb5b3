//! Validation diagnostics produced through the `jsonschema` engine.

use std::sync::Arc;

use serde_json::{json, Value};
use tcs_core::{simplify, SchemaError, Simplified};
use tcs_schema::{SchemaComposer, SchemaFiles, SchemaRepository, Validator};

async fn registered_validator() -> Arc<Validator> {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(
        root.path().join("agent.json"),
        r##"{"id": "#agent", "type": "object", "required": ["mbox", "objectType"]}"##,
    )
    .unwrap();
    std::fs::write(
        root.path().join("statement.json"),
        r##"{
            "id": "#statement",
            "type": "object",
            "required": ["actor", "verb"],
            "properties": {
                "actor": {"$ref": "#agent"},
                "verb": {"type": "object"}
            }
        }"##,
    )
    .unwrap();

    let validator = Arc::new(Validator::new(Arc::new(SchemaRepository::new())));
    SchemaComposer::new(SchemaFiles::new(Arc::clone(&validator)))
        .load_schema_dir_as(root.path(), "tcapi:1.0.1")
        .await
        .unwrap();
    validator
}

#[tokio::test]
async fn valid_instance_passes() {
    let validator = registered_validator().await;
    let statement = json!({
        "actor": {"mbox": "mailto:a@b.c", "objectType": "Agent"},
        "verb": {}
    });
    validator
        .validate(&statement, &json!({"$ref": "tcapi:1.0.1#statement"}))
        .unwrap();
    validator
        .validate_with_uri(&statement, "tcapi:1.0.1#statement")
        .unwrap();
}

#[tokio::test]
async fn sibling_failures_become_sibling_sub_errors() {
    let validator = registered_validator().await;
    let statement = json!({"actor": {}, "verb": {}});

    let err = validator
        .validate(&statement, &json!({"$ref": "tcapi:1.0.1#statement"}))
        .unwrap_err();
    let tree = match err {
        SchemaError::Invalid(tree) => tree,
        other => panic!("expected an error tree, got {other:?}"),
    };

    assert_eq!(tree.sub_errors.len(), 2);
    for child in &tree.sub_errors {
        assert!(child.is_leaf());
        assert_eq!(child.data_path.as_deref(), Some("/actor"));
        let relative = child.schema_relative_path.as_deref().unwrap();
        assert!(relative.starts_with("#agent"), "unexpected path {relative}");
    }
    let messages: Vec<&str> = tree.sub_errors.iter().map(|c| c.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("mbox")));
    assert!(messages.iter().any(|m| m.contains("objectType")));

    let simplified = simplify(&tree);
    assert_eq!(simplified.len(), 2);
    let Simplified::Seq(groups) = &simplified[1] else {
        panic!("expected grouped children, got {simplified:?}");
    };
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn failures_are_wrapped_with_the_uri() {
    let validator = registered_validator().await;
    let err = validator
        .validate_with_uri(&json!({"verb": {}}), "tcapi:1.0.1#statement")
        .unwrap_err();
    assert_eq!(err.to_string(), "INVALID as 'tcapi:1.0.1#statement'");
    let report = err.to_report();
    let leaf = &report.sub_errors[0];
    assert_eq!(leaf.data_path.as_deref(), Some("/"));
    assert!(leaf.message.contains("actor"));
    assert_eq!(
        leaf.schema_relative_path.as_deref(),
        Some("tcapi:1.0.1#statement/required")
    );
}

#[tokio::test]
async fn unknown_ids_are_not_validation_failures() {
    let validator = registered_validator().await;
    let err = validator
        .validate_with_uri(&json!({}), "tcapi:1.0.1#verb")
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownSchemaReference { .. }));
    assert_eq!(err.to_string(), "Unknown schema reference: \"tcapi:1.0.1#verb\"");
}

#[tokio::test]
async fn metaschema_failures_follow_internal_refs() {
    let validator = registered_validator().await;
    let err = validator
        .validate_schema(&json!({"required": "actor"}))
        .unwrap_err();
    let tree = match err {
        SchemaError::Invalid(tree) => tree,
        other => panic!("expected an error tree, got {other:?}"),
    };
    let value: Value = serde_json::to_value(&*tree).unwrap();
    assert_eq!(value["dataPath"], json!("/required"));
    assert_eq!(value["schemaRelativePath"], json!("/properties/required/type"));
}

#[tokio::test]
async fn recursive_schemas_keep_their_relative_paths() {
    let validator = Validator::new(Arc::new(SchemaRepository::new()));
    validator.repository().register(
        "tcapi:t",
        json!({
            "type": "object",
            "properties": {
                "node": {
                    "id": "#node",
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#node"}}
                    }
                }
            }
        }),
    );

    let err = validator
        .validate(&json!({"children": [{"name": 5}]}), &json!({"$ref": "tcapi:t#node"}))
        .unwrap_err();
    let tree = match err {
        SchemaError::Invalid(tree) => tree,
        other => panic!("expected an error tree, got {other:?}"),
    };
    assert_eq!(tree.data_path.as_deref(), Some("/children/0/name"));
    assert_eq!(
        tree.schema_relative_path.as_deref(),
        Some("#node/properties/name/type")
    );
}
