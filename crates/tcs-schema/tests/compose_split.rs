//! Round trips between fragment directories and composite schema files.

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};
use tcs_core::{render_report, SchemaError, DRAFT_04_SCHEMA_URI};
use tcs_schema::{SchemaComposer, SchemaFiles, SchemaRepository, SchemaSplitter, Validator};

fn files() -> SchemaFiles {
    SchemaFiles::new(Arc::new(Validator::new(Arc::new(SchemaRepository::new()))))
}

fn write(dir: &Path, name: &str, value: &Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn without_schema_uri(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("$schema");
    }
    value
}

#[tokio::test]
async fn join_then_split_reproduces_fragments() {
    let root = tempfile::tempdir().unwrap();
    let src = root.path().join("src");
    std::fs::create_dir(&src).unwrap();

    let agent = json!({
        "$schema": DRAFT_04_SCHEMA_URI,
        "id": "#agent",
        "type": "object",
        "properties": {"mbox": {"type": "string"}, "name": {"type": "string"}}
    });
    let statement = json!({
        "id": "#statement",
        "type": "object",
        "required": ["actor", "verb"],
        "properties": {"actor": {"$ref": "#agent"}, "verb": {"type": "object"}}
    });
    write(&src, "agent.json", &agent);
    write(&src, "statement.json", &statement);

    let composite_path = root.path().join("composite.json");
    let composer = SchemaComposer::new(files());
    composer.join(&src, &composite_path).await.unwrap();

    let composite = read(&composite_path);
    assert_eq!(composite["additionalProperties"], json!(false));
    assert_eq!(composite["type"], json!("object"));
    assert_eq!(composite["$schema"], json!(DRAFT_04_SCHEMA_URI));
    assert!(composite["properties"]["agent"].get("$schema").is_none());

    let out = root.path().join("out");
    let written = SchemaSplitter::new(files())
        .split_file(&composite_path, &out)
        .await
        .unwrap();
    assert_eq!(written, ["agent", "statement"]);

    assert_eq!(without_schema_uri(read(&out.join("agent.json"))), without_schema_uri(agent));
    assert_eq!(without_schema_uri(read(&out.join("statement.json"))), statement);
    assert_eq!(read(&out.join("statement.json"))["$schema"], json!(DRAFT_04_SCHEMA_URI));
}

#[tokio::test]
async fn wrong_id_is_reported_with_a_suggestion() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "a.json", &json!({"id": "#a"}));
    write(root.path(), "b.json", &json!({"id": "#wrong"}));

    let err = SchemaComposer::new(files())
        .compose_dir(root.path())
        .await
        .unwrap_err();
    let report = err.to_report();
    assert_eq!(report.message, "Field 'id' does not match its filename");
    assert_eq!(
        report.fpath,
        Some(root.path().join("b.json").display().to_string())
    );
    assert_eq!(
        report.suggestion,
        Some(json!({"id": {"is": "#wrong", "should_be": "#b"}}))
    );
}

#[tokio::test]
async fn empty_directory_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let src = root.path().join("empty");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("README.md"), "no schemas here").unwrap();
    let dst = root.path().join("composite.json");

    let err = SchemaComposer::new(files()).join(&src, &dst).await.unwrap_err();
    assert!(matches!(err, SchemaError::NoSchemaFiles { .. }));
    assert_eq!(
        err.to_string(),
        format!("The directory '{}' has no .json files!", src.display())
    );
    assert!(!dst.exists());
}

#[tokio::test]
async fn load_failure_renders_as_a_flat_chain() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "verb.json", &json!({"type": "object"}));

    let err = SchemaComposer::new(files())
        .load_schema_dir_as(root.path(), "tcapi:test")
        .await
        .unwrap_err();
    let rendered: Value = serde_json::from_str(&render_report(&err.to_report())).unwrap();
    assert_eq!(
        rendered["message"],
        json!(format!("Could not load schema directory '{}'", root.path().display()))
    );
    assert_eq!(rendered["subErrors"][0]["message"], json!("File has no id field"));
    assert_eq!(
        rendered["subErrors"][0]["suggestion"],
        json!({"id": {"should_be": "#verb"}})
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn compose_succeeds_iff_ids_match(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..5),
        corrupt in prop::option::of(0usize..5),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let corrupt = corrupt.filter(|i| *i < names.len());

        let root = tempfile::tempdir().unwrap();
        for (i, name) in names.iter().enumerate() {
            let id = if Some(i) == corrupt {
                format!("#{name}x")
            } else {
                format!("#{name}")
            };
            write(root.path(), &format!("{name}.json"), &json!({"id": id, "type": "object"}));
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let result = runtime.block_on(SchemaComposer::new(files()).compose_dir(root.path()));

        match corrupt {
            None => {
                let composite = result.unwrap();
                let keys: Vec<String> = composite["properties"].as_object().unwrap().keys().cloned().collect();
                prop_assert_eq!(keys, names);
            }
            Some(i) => {
                let err = result.unwrap_err();
                match err {
                    SchemaError::IdMismatch { fpath, suggestion } => {
                        prop_assert_eq!(fpath, root.path().join(format!("{}.json", names[i])));
                        prop_assert_eq!(suggestion.should_be, format!("#{}", names[i]));
                    }
                    other => prop_assert!(false, "expected IdMismatch, got {:?}", other),
                }
            }
        }
    }
}
