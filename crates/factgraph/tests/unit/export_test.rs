//! Export tests.

use factgraph::export::{export_json, write_json};
use factgraph::{AssociationKind, EntityKind, FactModel, SourceAnchor};

fn sample_model() -> FactModel {
    let mut model = FactModel::new();
    let pkg = model.get_or_create(EntityKind::Package, "shapes");
    let class = model.get_or_create(EntityKind::Class, "shapes.Sum");
    let method = model.get_or_create(EntityKind::Method, "shapes.Sum.compute()");
    model.set_parent(class, pkg).unwrap();
    model.set_parent(method, class).unwrap();
    model
        .declare(class, SourceAnchor::new("Sum.java", 0, 120))
        .unwrap();
    model
        .add_association(AssociationKind::Invocation, method, method, None, "compute()")
        .unwrap();
    model
}

#[test]
fn test_export_contains_parents_and_anchors() {
    let model = sample_model();
    let doc: serde_json::Value = serde_json::from_str(&export_json(&model).unwrap()).unwrap();

    let entities = doc["entities"].as_array().unwrap();
    let class = entities
        .iter()
        .find(|e| e["name"] == "shapes.Sum")
        .unwrap();
    assert_eq!(class["parent"], "shapes");
    assert_eq!(class["anchor"]["end"], 120);
}

#[test]
fn test_write_json_to_file() {
    let model = sample_model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    write_json(&model, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("shapes.Sum.compute()"));
}
